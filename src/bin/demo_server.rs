use anyhow::Context;
use clap::Parser;
use http::StatusCode;
use routechain::config::{ListenOptions, LogFormat};
use routechain::{
    handler, telemetry, CookieOptions, HandlerResult, Hook, RequestEvent, Response, Router, SameSite, Server, State,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "routechain-demo")]
#[command(about = "Serve a small routechain demo application", long_about = None)]
struct Cli {
    /// TOML file with listen options; otherwise ROUTECHAIN_* variables are used
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured port
    #[arg(short, long, env = "ROUTECHAIN_PORT")]
    port: Option<u16>,

    /// Override the configured log format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut options = match &cli.config {
        Some(path) => ListenOptions::from_file(path)?,
        None => ListenOptions::from_env()?,
    };
    if let Some(port) = cli.port {
        options.port = port;
    }
    if let Some(format) = cli.log_format {
        options.log_format = format;
    }
    options.validate()?;

    telemetry::init_tracing(options.log_format)?;

    let server = build_server()?;
    let handle = server.listen(&options).context("failed to start server")?;
    handle.wait_ready().context("server did not become ready")?;
    info!(addr = %handle.addr(), "Demo ready");

    handle
        .join()
        .map_err(|_| anyhow::anyhow!("server coroutine panicked"))?;
    Ok(())
}

fn build_server() -> anyhow::Result<Server> {
    let mut users = Router::with_prefix("/users")?.with_state([("resource", "user")].into_iter().collect());
    users
        .get("/", handler(|_ev| Ok(Some(Response::json(StatusCode::OK, &json!(["ada", "grace"]))))))?
        .get("/:id", handler(|ev| {
            let id = ev.param("id").unwrap_or_default();
            let resource = ev.state().get_str("resource").unwrap_or("thing");
            Ok(Some(Response::json(
                StatusCode::OK,
                &json!({ "id": id, "kind": resource }),
            )))
        }))?;

    let mut api = Router::with_prefix("/api/:version")?;
    api.use_handler(handler(|ev| {
        let version = ev.param("version").unwrap_or_default().to_string();
        ev.headers_mut().set("X-Api-Version", version);
        Ok(None)
    }));
    api.mount(users)?;

    let mut server = Server::new().with_state([("app", "routechain-demo")].into_iter().collect::<State>());
    server
        .use_hook(Hook::logger())
        .use_hook(Hook::at("/session/*?")?.pre(require_session))
        .use_handler(handler(|ev| {
            let id = ev.request_id().to_string();
            ev.headers_mut().set("X-Request-Id", id);
            Ok(None)
        }))
        .get("/", handler(|ev| {
            let app = ev.state().get_str("app").unwrap_or_default();
            Ok(Some(Response::text(format!("Hello from {app}"))))
        }))?
        .post("/login", handler(|ev| {
            let options = CookieOptions::new().path("/").http_only().same_site(SameSite::Lax);
            ev.cookies().set("session", "demo", &options)?;
            Ok(Some(Response::text("logged in")))
        }))?
        .post("/logout", handler(|ev| {
            ev.cookies().delete("session", &CookieOptions::new().path("/"))?;
            Ok(Some(Response::text("logged out")))
        }))?
        .get("/session/whoami", handler(|ev| {
            let user = ev.state().get_str("user").unwrap_or("anonymous");
            Ok(Some(Response::text(user.to_string())))
        }))?
        .mount(api)?;
    Ok(server)
}

fn require_session(ev: &mut RequestEvent) -> HandlerResult {
    match ev.cookie("session").map(str::to_string) {
        Some(user) => {
            ev.state_mut().set("user", user);
            Ok(None)
        }
        None => Ok(Some(Response::text("Unauthorized").with_status(StatusCode::UNAUTHORIZED))),
    }
}
