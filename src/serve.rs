//! HTTP server for the dashboard
//!
//! `courtlens serve` → starts server, serves the search and results pages and
//! the JSON API they are built on.
//!
//! Routing is a plain function from [`RequestParts`] to [`Reply`], so it can be
//! exercised without a socket; [`start`] adapts it to tiny_http.

use crate::auth::{
    password_cookie_value, AuthContext, AuthError, Authenticator, LoginGrant, PASSWORD_COOKIE, TOKEN_COOKIE,
};
use crate::chart::ViewMode;
use crate::db::{Database, DbError};
use crate::pages::{self, ResultsView};
use crate::selection::{self, Selection, SelectionKind, Selections};
use crate::title::format_specification_title;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, error, info, warn};

const JSON: &str = "application/json";
const HTML: &str = "text/html; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";

/// Shared state for request handling
pub struct App {
    pub db: Database,
    pub auth: Authenticator,
}

impl App {
    pub fn new(db: Database, auth: Authenticator) -> Self {
        Self { db, auth }
    }
}

/// The parts of an HTTP request routing looks at
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RequestParts {
    pub fn get(url: &str) -> Self {
        Self { method: Method::Get, url: url.to_string(), headers: Vec::new(), body: String::new() }
    }

    pub fn post(url: &str, body: &str) -> Self {
        Self { method: Method::Post, url: url.to_string(), headers: Vec::new(), body: body.to_string() }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or("/")
    }

    pub fn query(&self) -> &str {
        self.url.split_once('?').map(|(_, q)| q).unwrap_or("")
    }

    fn auth_context(&self) -> AuthContext {
        AuthContext::from_headers(self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// Response produced by routing
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: String) -> Self {
        Self { status, content_type, body, headers: Vec::new() }
    }

    fn html(body: String) -> Self {
        Self::new(200, HTML, body)
    }

    fn json<T: Serialize>(data: &T) -> Self {
        match serde_json::to_string(data) {
            Ok(body) => Self::new(200, JSON, body),
            Err(e) => Self::error(ApiError::Internal(e.to_string())),
        }
    }

    fn redirect(status: u16, location: &str) -> Self {
        Self::new(status, TEXT, String::new()).with_header("Location", location)
    }

    fn error(err: ApiError) -> Self {
        let status = err.status_code();
        if status >= 500 {
            error!(error = %err, "request failed");
        }
        let body = serde_json::json!({ "error": err.client_message() }).to_string();
        Self::new(status, JSON, body)
    }

    fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn with_cleared_credentials(self) -> Self {
        self.with_header("Set-Cookie", &clear_cookie(TOKEN_COOKIE))
            .with_header("Set-Cookie", &clear_cookie(PASSWORD_COOKIE))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn session_cookie(name: &str, value: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", name, value)
}

fn clear_cookie(name: &str) -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", name)
}

/// Errors surfaced at the API boundary
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Server-side details stay in the log
    fn client_message(&self) -> String {
        match self {
            Self::Database(_) => "Database error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            AuthError::NotConfigured => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

// ============================================================================
// Query parameters
// ============================================================================

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ResultsParams {
    selections: Option<String>,
    view: Option<String>,
}

impl ResultsParams {
    fn selections(&self) -> Selections {
        self.selections.as_deref().map(selection::decode).unwrap_or_default()
    }

    fn view(&self) -> ViewMode {
        self.view.as_deref().and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct SearchParams {
    type1: Option<String>,
    value1: Option<String>,
    type2: Option<String>,
    value2: Option<String>,
}

impl SearchParams {
    fn selections(&self) -> Selections {
        Selections::from_pair(
            form_selection(self.type1.as_deref(), self.value1.as_deref()),
            form_selection(self.type2.as_deref(), self.value2.as_deref()),
        )
    }
}

/// Blank or unparseable form fields become nulls
fn form_selection(kind: Option<&str>, value: Option<&str>) -> Selection {
    Selection {
        kind: kind.and_then(|k| k.parse::<SelectionKind>().ok()),
        value: value.and_then(|v| v.trim().parse::<i32>().ok()),
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct TitleParams {
    court: Option<i32>,
    judge: Option<i32>,
    charge: Option<i32>,
}

#[derive(Deserialize, Debug)]
struct LoginForm {
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: Option<String>,
}

#[derive(Serialize)]
struct TitleResponse {
    title: String,
}

fn parse_query<T: for<'de> Deserialize<'de> + Default>(query: &str) -> T {
    serde_urlencoded::from_str(query).unwrap_or_default()
}

// ============================================================================
// Server
// ============================================================================

/// Start server and serve requests until the process exits
pub fn start(app: App, bind: &str, port: u16, open_browser: bool) -> std::io::Result<()> {
    let addr = format!("{}:{}", bind, port);
    let server = Server::http(&addr).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", port);
    info!(%addr, "courtlens listening");
    if app.auth.is_open() {
        warn!("no dashboard password configured; all pages are public");
    }

    if open_browser {
        if let Err(e) = open::that(&url) {
            warn!(error = %e, "could not open browser");
        }
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(&app, request) {
            error!(error = %e, "failed to respond");
        }
    }

    Ok(())
}

fn handle_request(app: &App, mut request: Request) -> std::io::Result<()> {
    let mut body = String::new();
    if *request.method() == Method::Post {
        request.as_reader().read_to_string(&mut body)?;
    }

    let parts = RequestParts {
        method: request.method().clone(),
        url: request.url().to_string(),
        headers: request
            .headers()
            .iter()
            .map(|h| (h.field.as_str().as_str().to_string(), h.value.as_str().to_string()))
            .collect(),
        body,
    };

    let reply = route(app, &parts);
    debug!(method = ?parts.method, path = parts.path(), status = reply.status, "request");

    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response.add_header(h);
    }
    for (name, value) in &reply.headers {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(h) => response.add_header(h),
            Err(()) => warn!(header = %name, "dropping invalid response header"),
        }
    }
    request.respond(response)
}

/// Dispatch one request
pub fn route(app: &App, req: &RequestParts) -> Reply {
    let path = req.path();

    // Routes reachable without credentials
    match (&req.method, path) {
        (Method::Get, "/login") => {
            let failed = req.query().split('&').any(|p| p == "error=1");
            return Reply::html(pages::login_page(failed));
        }
        (Method::Post, "/login") => return form_login(app, req),
        (Method::Post, "/api/login") => return api_login(app, req),
        (Method::Get, "/logout") => return Reply::redirect(302, "/login").with_cleared_credentials(),
        _ => {}
    }

    if !app.auth.is_authenticated(&req.auth_context()) {
        return if path.starts_with("/api/") {
            Reply::error(ApiError::Unauthorized("login required".to_string())).with_cleared_credentials()
        } else {
            Reply::redirect(302, "/login").with_cleared_credentials()
        };
    }

    let result = match (&req.method, path) {
        (Method::Get, "/") => Ok(search(app).unwrap_or_else(page_error)),
        (Method::Get, "/search") => {
            let params: SearchParams = parse_query(req.query());
            let token = selection::encode(&params.selections());
            Ok(Reply::redirect(302, &format!("/results?selections={}", token)))
        }
        (Method::Get, "/results") => {
            let params: ResultsParams = parse_query(req.query());
            let reply = ResultsView::load(&app.db, params.selections(), params.view())
                .map(|view| Reply::html(pages::results_page(&view)))
                .unwrap_or_else(|e| page_error(e.into()));
            Ok(reply)
        }

        (Method::Get, "/api/charges") => app.db.charges().map(|c| Reply::json(&c)).map_err(ApiError::from),
        (Method::Get, p) if p.starts_with("/api/charges/") => charge_by_id(app, &p["/api/charges/".len()..]),
        (Method::Get, "/api/courts") => app.db.courts().map(|c| Reply::json(&c)).map_err(ApiError::from),
        (Method::Get, "/api/judges") => app.db.judges().map(|j| Reply::json(&j)).map_err(ApiError::from),
        (Method::Get, "/api/bail-decisions") => {
            let params: ResultsParams = parse_query(req.query());
            app.db
                .bail_decisions(&params.selections().filter(), params.view())
                .map(|rows| Reply::json(&rows))
                .map_err(ApiError::from)
        }
        (Method::Get, "/api/results") => {
            let params: ResultsParams = parse_query(req.query());
            ResultsView::load(&app.db, params.selections(), params.view())
                .map(|view| Reply::json(&view))
                .map_err(ApiError::from)
        }
        (Method::Get, "/api/title") => {
            let params: TitleParams = parse_query(req.query());
            let title = format_specification_title(
                params.court.unwrap_or(0),
                params.judge.unwrap_or(0),
                params.charge.unwrap_or(0),
                None,
                &app.db,
            );
            Ok(Reply::json(&TitleResponse { title }))
        }

        (_, p) if p.starts_with("/api/") => Err(ApiError::NotFound(p.to_string())),
        _ => Ok(Reply::new(404, TEXT, "Not found".to_string())),
    };

    result.unwrap_or_else(Reply::error)
}

/// HTML routes report failures inline rather than as JSON
fn page_error(err: ApiError) -> Reply {
    let status = err.status_code();
    if status >= 500 {
        error!(error = %err, "page failed");
    }
    Reply::new(status, HTML, pages::error_page(&err.client_message()))
}

fn search(app: &App) -> Result<Reply, ApiError> {
    let courts = app.db.courts()?;
    let judges = app.db.judges()?;
    let charges = app.db.charges()?;
    Ok(Reply::html(pages::search_page(&courts, &judges, &charges)))
}

fn charge_by_id(app: &App, raw_id: &str) -> Result<Reply, ApiError> {
    let id: i32 = raw_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid charge id '{}'", raw_id)))?;

    match app.db.charge(id)? {
        Some(charge) => Ok(Reply::json(&charge)),
        None => Err(ApiError::NotFound(format!("charge {}", id))),
    }
}

fn form_login(app: &App, req: &RequestParts) -> Reply {
    let password = serde_urlencoded::from_str::<LoginForm>(&req.body)
        .map(|f| f.password)
        .unwrap_or_default();

    match app.auth.login(&password) {
        Ok(LoginGrant::Token(token)) => {
            info!("login succeeded");
            Reply::redirect(303, "/").with_header("Set-Cookie", &session_cookie(TOKEN_COOKIE, &token))
        }
        Ok(LoginGrant::Password) => {
            info!("login succeeded (password cookie)");
            let cookie = session_cookie(PASSWORD_COOKIE, &password_cookie_value(&password));
            Reply::redirect(303, "/").with_header("Set-Cookie", &cookie)
        }
        Err(AuthError::NotConfigured) => Reply::redirect(303, "/"),
        Err(e) => {
            warn!(error = %e, "login failed");
            Reply::redirect(303, "/login?error=1").with_cleared_credentials()
        }
    }
}

fn api_login(app: &App, req: &RequestParts) -> Reply {
    let form: LoginForm = match serde_json::from_str(&req.body) {
        Ok(f) => f,
        Err(e) => return Reply::error(ApiError::BadRequest(format!("invalid login body: {}", e))),
    };

    match app.auth.login(&form.password) {
        Ok(LoginGrant::Token(token)) => {
            let cookie = session_cookie(TOKEN_COOKIE, &token);
            Reply::json(&LoginResponse { token: Some(token) }).with_header("Set-Cookie", &cookie)
        }
        Ok(LoginGrant::Password) => {
            let cookie = session_cookie(PASSWORD_COOKIE, &password_cookie_value(&form.password));
            Reply::json(&LoginResponse { token: None }).with_header("Set-Cookie", &cookie)
        }
        Err(e) => {
            warn!(error = %e, "login failed");
            Reply::error(ApiError::from(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::seeded;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn open_app() -> App {
        App::new(seeded(), Authenticator::open())
    }

    fn guarded_app() -> App {
        let auth = Authenticator::new(Some("hunter2".into()), Some(SECRET.into()), 3600).unwrap();
        App::new(seeded(), auth)
    }

    fn body_json(reply: &Reply) -> serde_json::Value {
        serde_json::from_str(&reply.body).unwrap()
    }

    /// File-backed app whose `tables` are dropped behind the pool's back
    fn broken_app(name: &str, tables: &[&str]) -> App {
        use diesel::sqlite::SqliteConnection;
        use diesel::{Connection, RunQueryDsl};

        let dir = std::env::temp_dir().join(format!("courtlens-serve-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.db");
        let _ = std::fs::remove_file(&path);

        let db = Database::open_at(&path).unwrap();
        let mut conn = SqliteConnection::establish(path.to_str().unwrap()).unwrap();
        for table in tables {
            diesel::sql_query(format!("DROP TABLE {}", table)).execute(&mut conn).unwrap();
        }
        App::new(db, Authenticator::open())
    }

    // ==========================================================================
    // API ROUTES
    // ==========================================================================

    #[test]
    fn test_api_charges() {
        let reply = route(&open_app(), &RequestParts::get("/api/charges"));
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, JSON);

        let json = body_json(&reply);
        let charges = json.as_array().unwrap();
        assert_eq!(charges.len(), 2);
        assert_eq!(charges[1]["name"], "Theft");
        assert_eq!(charges[1]["charge_id"], 5);
        assert_eq!(charges[1]["severity"], "M1");
    }

    #[test]
    fn test_api_charges_database_error() {
        let app = broken_app("charges", &["charges"]);
        let reply = route(&app, &RequestParts::get("/api/charges"));
        assert_eq!(reply.status, 500);
        assert_eq!(reply.content_type, JSON);
        assert_eq!(body_json(&reply)["error"], "Database error");
    }

    #[test]
    fn test_results_page_database_error_is_inline() {
        let app = broken_app("results", &["bail_decisions"]);
        let reply = route(&app, &RequestParts::get("/results"));
        assert_eq!(reply.status, 500);
        assert_eq!(reply.content_type, HTML);
        assert!(reply.body.contains(r#"<p class="error">Database error</p>"#));
        assert!(!reply.body.contains("no such table"));
    }

    #[test]
    fn test_api_charge_by_id() {
        let app = open_app();
        let reply = route(&app, &RequestParts::get("/api/charges/7"));
        assert_eq!(body_json(&reply)["name"], "Burglary");

        let missing = route(&app, &RequestParts::get("/api/charges/404"));
        assert_eq!(missing.status, 404);
        assert!(body_json(&missing)["error"].is_string());

        let bad = route(&app, &RequestParts::get("/api/charges/abc"));
        assert_eq!(bad.status, 400);
    }

    #[test]
    fn test_api_bail_decisions_with_token() {
        let token = selection::encode(&Selections::from_pair(
            Selection::new(SelectionKind::Court, 1),
            Selection::empty(),
        ));
        let url = format!("/api/bail-decisions?selections={}&view=comparative", token);
        let json = body_json(&route(&open_app(), &RequestParts::get(&url)));

        let monetary = json
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["type"] == "Monetary")
            .unwrap();
        assert!((monetary["percentage"].as_f64().unwrap() - 1.875).abs() < 1e-9);
        assert!(monetary["averageCost"].is_number());
    }

    #[test]
    fn test_api_bail_decisions_bad_token_is_global() {
        let reply = route(&open_app(), &RequestParts::get("/api/bail-decisions?selections=!!!"));
        assert_eq!(reply.status, 200);
        let total: i64 = body_json(&reply)
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["count"].as_i64().unwrap())
            .sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_api_results() {
        let token = selection::encode(&Selections::from_pair(
            Selection::new(SelectionKind::Charge, 7),
            Selection::new(SelectionKind::Judge, 11),
        ));
        let json = body_json(&route(&open_app(), &RequestParts::get(&format!("/api/results?selections={}", token))));
        assert_eq!(json["title"], "Hon. Jones | Burglary");
        assert_eq!(json["view"], "objective");
        assert_eq!(json["cost"]["metric"], "average_cost");
    }

    #[test]
    fn test_api_title() {
        let app = open_app();
        let json = body_json(&route(&app, &RequestParts::get("/api/title")));
        assert_eq!(json["title"], "Global");

        let json = body_json(&route(&app, &RequestParts::get("/api/title?court=2&judge=10")));
        assert_eq!(json["title"], "Hon. Smith | Common Pleas");
    }

    #[test]
    fn test_unknown_routes() {
        let app = open_app();
        assert_eq!(route(&app, &RequestParts::get("/api/nope")).status, 404);
        assert_eq!(route(&app, &RequestParts::get("/nope")).status, 404);
    }

    // ==========================================================================
    // PAGES
    // ==========================================================================

    #[test]
    fn test_search_redirects_to_results_token() {
        let reply = route(&open_app(), &RequestParts::get("/search?type1=court&value1=1&type2=&value2="));
        assert_eq!(reply.status, 302);

        let location = reply.header("Location").unwrap();
        let token = location.strip_prefix("/results?selections=").unwrap();
        let decoded = selection::decode(token);
        assert_eq!(
            decoded,
            Selections::from_pair(Selection::new(SelectionKind::Court, 1), Selection::empty())
        );
    }

    #[test]
    fn test_results_page_renders() {
        let token = selection::encode(&Selections::from_pair(
            Selection::new(SelectionKind::Court, 2),
            Selection::empty(),
        ));
        let reply = route(&open_app(), &RequestParts::get(&format!("/results?selections={}", token)));
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("Common Pleas"));
        assert!(reply.body.contains("Bail Decisions"));
    }

    #[test]
    fn test_search_page_renders() {
        let reply = route(&open_app(), &RequestParts::get("/"));
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("Hon. Jones"));
    }

    // ==========================================================================
    // AUTHENTICATION GATE
    // ==========================================================================

    #[test]
    fn test_unauthenticated_page_redirects_to_login() {
        let reply = route(&guarded_app(), &RequestParts::get("/results?selections=x"));
        assert_eq!(reply.status, 302);
        assert_eq!(reply.header("Location"), Some("/login"));

        let cleared: Vec<&str> = reply
            .headers
            .iter()
            .filter(|(k, _)| k == "Set-Cookie")
            .map(|(_, v)| v.as_str())
            .collect();
        assert!(cleared.iter().any(|c| c.starts_with("token=;")));
        assert!(cleared.iter().any(|c| c.starts_with("password=;")));
    }

    #[test]
    fn test_unauthenticated_api_is_401() {
        let reply = route(&guarded_app(), &RequestParts::get("/api/charges"));
        assert_eq!(reply.status, 401);
        assert!(body_json(&reply)["error"].is_string());
    }

    #[test]
    fn test_login_page_is_public() {
        let reply = route(&guarded_app(), &RequestParts::get("/login?error=1"));
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("Incorrect password"));
    }

    #[test]
    fn test_api_login_then_bearer_access() {
        let app = guarded_app();
        let reply = route(&app, &RequestParts::post("/api/login", r#"{"password":"hunter2"}"#));
        assert_eq!(reply.status, 200);
        let token = body_json(&reply)["token"].as_str().unwrap().to_string();

        let req = RequestParts::get("/api/courts").with_header("Authorization", &format!("Bearer {}", token));
        let reply = route(&app, &req);
        assert_eq!(reply.status, 200);
        assert_eq!(body_json(&reply).as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_api_login_wrong_password() {
        let reply = route(&guarded_app(), &RequestParts::post("/api/login", r#"{"password":"nope"}"#));
        assert_eq!(reply.status, 401);

        let reply = route(&guarded_app(), &RequestParts::post("/api/login", "not json"));
        assert_eq!(reply.status, 400);
    }

    #[test]
    fn test_form_login_sets_cookie() {
        let app = guarded_app();
        let reply = route(&app, &RequestParts::post("/login", "password=hunter2"));
        assert_eq!(reply.status, 303);
        assert_eq!(reply.header("Location"), Some("/"));

        let cookie = reply.header("Set-Cookie").unwrap();
        let token = cookie.split(';').next().unwrap();
        let req = RequestParts::get("/").with_header("Cookie", token);
        assert_eq!(route(&app, &req).status, 200);
    }

    #[test]
    fn test_password_cookie_login_with_separators() {
        let auth = Authenticator::new(Some("a;b c ü".into()), None, 3600).unwrap();
        let app = App::new(seeded(), auth);

        let reply = route(&app, &RequestParts::post("/login", "password=a%3Bb+c+%C3%BC"));
        assert_eq!(reply.status, 303);
        assert_eq!(reply.header("Location"), Some("/"));

        let cookie = reply.header("Set-Cookie").unwrap();
        assert!(cookie.is_ascii());
        let pair = cookie.split(';').next().unwrap();
        let req = RequestParts::get("/").with_header("Cookie", pair);
        assert_eq!(route(&app, &req).status, 200);

        let reply = route(&app, &RequestParts::post("/api/login", r#"{"password":"a;b c ü"}"#));
        assert_eq!(reply.status, 200);
        assert!(reply.header("Set-Cookie").unwrap().is_ascii());
    }

    #[test]
    fn test_form_login_failure() {
        let reply = route(&guarded_app(), &RequestParts::post("/login", "password=wrong"));
        assert_eq!(reply.header("Location"), Some("/login?error=1"));
    }

    #[test]
    fn test_legacy_password_header() {
        let req = RequestParts::get("/api/judges").with_header("X-Dashboard-Password", "hunter2");
        assert_eq!(route(&guarded_app(), &req).status, 200);
    }

    #[test]
    fn test_logout_clears_cookies() {
        let reply = route(&guarded_app(), &RequestParts::get("/logout"));
        assert_eq!(reply.status, 302);
        assert!(reply.headers.iter().any(|(k, v)| k == "Set-Cookie" && v.starts_with("token=;")));
    }
}
