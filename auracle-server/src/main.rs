use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{error, info};

use serde::Deserialize;
use auracle_core::{AuracleError, Session, SessionConfig};

/// Command-line options of the server.
#[derive(Parser, Debug)]
#[command(name = "auracle-server")]
#[command(about = "Serve word generation, training and identification over HTTP")]
struct Args {
	/// JSON session configuration (every field optional)
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Data folder (overrides the configuration)
	#[arg(short, long)]
	data_dir: Option<PathBuf>,

	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	#[arg(short, long, default_value = "5000")]
	port: u16,
}

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	limit: Option<usize>,
}

struct SharedData {
	session: Session
}

/// Maps a core error to an HTTP response: user mistakes are 400s.
fn error_response(e: AuracleError) -> HttpResponse {
	match e {
		AuracleError::Validation(message) => HttpResponse::BadRequest().body(message),
		AuracleError::UnknownModel(name) => HttpResponse::NotFound().body(format!("Model {} not found", name)),
		other => {
			error!("{}", other);
			HttpResponse::InternalServerError().body(other.to_string())
		}
	}
}

fn respond(result: Result<String, AuracleError>) -> HttpResponse {
	match result {
		Ok(body) => HttpResponse::Ok().body(body),
		Err(e) => error_response(e),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates new words from the session model, one per line.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};

	let result = shared_data.session.generate().map(|words| match query.limit {
		Some(limit) => words.lines().take(limit).collect::<Vec<_>>().join("\n"),
		None => words,
	});
	respond(result)
}

/// HTTP POST endpoint `/v1/improve`
///
/// Runs one training pass against the request body and returns the
/// per-character accuracy visualization as HTML.
#[post("/v1/improve")]
async fn post_improve(data: web::Data<Mutex<SharedData>>, body: String) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	respond(shared_data.session.improve(&body))
}

#[post("/v1/identify")]
async fn post_identify(data: web::Data<Mutex<SharedData>>, body: String) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	respond(shared_data.session.identify(&body))
}

#[post("/v1/score")]
async fn post_score(data: web::Data<Mutex<SharedData>>, body: String) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	respond(shared_data.session.score(&body))
}

#[post("/v1/orthography")]
async fn post_orthography(data: web::Data<Mutex<SharedData>>, body: String) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	HttpResponse::Ok().body(shared_data.session.orthography(&body))
}

#[post("/v1/sanitize")]
async fn post_sanitize(data: web::Data<Mutex<SharedData>>, body: String) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	HttpResponse::Ok().body(shared_data.session.sanitize(&body))
}

/// HTTP GET endpoint `/v1/models`: loaded reference model names.
#[get("/v1/models")]
async fn get_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	HttpResponse::Ok().body(shared_data.session.reference_names().join("\n"))
}

/// Main entry point for the server.
///
/// Opens one session from the data folder, wraps it in a `Mutex` and
/// starts an Actix-web HTTP server. Each request runs to completion while
/// holding the lock, so training passes never interleave.
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();
	let args = Args::parse();

	let mut config = match &args.config {
		Some(path) => SessionConfig::from_file(path)?,
		None => SessionConfig::default(),
	};
	if let Some(data_dir) = args.data_dir {
		config.data_dir = data_dir;
	}

	let session = Session::open(config)?;
	info!("Session ready with models: {}", session.reference_names().join(", "));
	let shared_data = web::Data::new(Mutex::new(SharedData { session }));

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.service(get_generated)
			.service(post_improve)
			.service(post_identify)
			.service(post_score)
			.service(post_orthography)
			.service(post_sanitize)
			.service(get_models)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await?;
	Ok(())
}
