use std::{collections::HashSet, sync::Arc, time::Instant};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_EMAIL: &str = "admin@clinic.test";
pub const DEFAULT_PASSWORD: &str = "admin123";

/// The single account the mock backend accepts.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email: DEFAULT_EMAIL.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub senha: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
}

#[derive(Clone)]
pub struct AppState {
    credentials: Arc<Credentials>,
    sessions: Arc<RwLock<HashSet<String>>>,
    started: Instant,
}

pub fn app() -> Router {
    app_with(Credentials::default())
}

pub fn app_with(credentials: Credentials) -> Router {
    let state = AppState {
        credentials: Arc::new(credentials),
        sessions: Arc::new(RwLock::new(HashSet::new())),
        started: Instant::now(),
    };
    Router::new()
        .route("/health", get(root_health))
        .route("/api/health", get(api_health))
        .route("/api/auth/login", post(login))
        .route("/api/financeiro/stats", get(financial_stats))
        .route("/api/diagnostic/db-check", get(db_check))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Credentials::default()).await
}

pub async fn run_with(listener: TcpListener, credentials: Credentials) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(credentials)).await
}

async fn root_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "database": "connected",
        "uptime": state.started.elapsed().as_secs_f64(),
    }))
}

async fn api_health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "api" }))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<Value>)> {
    if input.email != state.credentials.email || input.senha != state.credentials.password {
        warn!(email = %input.email, "rejected login");
        return Err(error_body(StatusCode::UNAUTHORIZED, "Credenciais inválidas"));
    }
    let token = Uuid::new_v4().to_string();
    state.sessions.write().await.insert(token.clone());
    info!(email = %input.email, "issued session token");
    Ok(Json(LoginResponse {
        token,
        email: input.email,
    }))
}

async fn financial_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorize(&state, &headers).await?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "receitasMes": 2350.00,
            "despesasMes": 1420.50,
            "saldoMes": 929.50,
            "receitasPendentes": 450.00,
            "despesasPendentes": 120.00,
            "fluxoCaixa": {
                "receitas": [
                    { "mes": "Jan", "valor": 2350 },
                    { "mes": "Dez", "valor": 2100 },
                    { "mes": "Nov", "valor": 1950 }
                ],
                "despesas": [
                    { "mes": "Jan", "valor": 1420 },
                    { "mes": "Dez", "valor": 1300 },
                    { "mes": "Nov", "valor": 1150 }
                ]
            },
            "categorias": [
                { "nome": "Consultas", "valor": 1200, "percentual": 51 },
                { "nome": "Fisioterapia", "valor": 800, "percentual": 34 },
                { "nome": "Outros", "valor": 350, "percentual": 15 }
            ]
        }
    })))
}

async fn db_check() -> Json<Value> {
    let expected = ["empresas", "usuarios", "pacientes", "prescricoes"];
    let results: Vec<Value> = expected
        .iter()
        .map(|table| json!({ "table": table, "ok": true, "missing": [] }))
        .collect();
    Json(json!({
        "tables": expected,
        "expected": expected,
        "results": results,
        "ok": true,
    }))
}

async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| error_body(StatusCode::UNAUTHORIZED, "Token não fornecido"))?;
    if state.sessions.read().await.contains(token) {
        Ok(())
    } else {
        Err(error_body(StatusCode::UNAUTHORIZED, "Token inválido"))
    }
}

fn error_body(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "success": false, "error": message })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_uses_portuguese_password_key() {
        let input: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.c","senha":"x"}"#).unwrap();
        assert_eq!(input.email, "a@b.c");
        assert_eq!(input.senha, "x");
    }

    #[test]
    fn login_request_rejects_missing_password() {
        let result: Result<LoginRequest, _> = serde_json::from_str(r#"{"email":"a@b.c"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn login_response_serializes_token() {
        let response = LoginResponse {
            token: "t".to_string(),
            email: "a@b.c".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token"], "t");
    }

    #[test]
    fn error_body_shape() {
        let (status, Json(body)) = error_body(StatusCode::UNAUTHORIZED, "nope");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "nope");
    }
}
