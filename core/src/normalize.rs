//! Total conversion of loosely-shaped backend JSON into display records.
//!
//! # Design
//! Nothing here fails. Missing or malformed totals default to zero, series
//! and category elements that lack a label or an amount are dropped rather
//! than padded with zeros, and anything that is not a JSON object yields
//! `FinancialSummary::default()`.
//!
//! The stats endpoint answers in two shapes: wrapped (`{"data": {...}}`)
//! and flat. `stats_object` tries the wrapped shape first.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::TransportError;
use crate::http::HttpResponse;
use crate::outcome::ResponseBody;

const REVENUE_KEYS: &[&str] = &["receitas", "receitasMes"];
const EXPENSE_KEYS: &[&str] = &["despesas", "despesasMes"];
const BALANCE_KEYS: &[&str] = &["saldo", "saldoMes"];
const CASH_FLOW_KEY: &str = "fluxoCaixa";
const CATEGORIES_KEY: &str = "categorias";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAmount {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub revenue: f64,
    pub expenses: f64,
    pub balance: f64,
    pub revenue_by_series: Vec<SeriesPoint>,
    pub expenses_by_series: Vec<SeriesPoint>,
    pub categories: Vec<CategoryAmount>,
}

/// HTTP status of a health probe, or `Err` when no response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCode {
    Status(u16),
    Err,
}

impl fmt::Display for HealthCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthCode::Status(code) => write!(f, "{code}"),
            HealthCode::Err => write!(f, "ERR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthStatus {
    pub status_code: HealthCode,
    pub payload: ResponseBody,
    pub is_json: bool,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status_code == HealthCode::Status(200)
    }
}

/// Build a `FinancialSummary` from any JSON value.
pub fn financial_summary(payload: &Value) -> FinancialSummary {
    let Some(stats) = stats_object(payload) else {
        return FinancialSummary::default();
    };

    let revenue = first_number(stats, REVENUE_KEYS).unwrap_or(0.0);
    let expenses = first_number(stats, EXPENSE_KEYS).unwrap_or(0.0);
    let balance = first_number(stats, BALANCE_KEYS).unwrap_or(revenue - expenses);

    let cash_flow = stats.get(CASH_FLOW_KEY).and_then(Value::as_object);
    let series = |key: &str| {
        cash_flow
            .and_then(|flow| flow.get(key))
            .map(|v| collect_pairs(v, "mes", "valor", |label, amount| SeriesPoint { label, amount }))
            .unwrap_or_default()
    };

    FinancialSummary {
        revenue,
        expenses,
        balance,
        revenue_by_series: series("receitas"),
        expenses_by_series: series("despesas"),
        categories: stats
            .get(CATEGORIES_KEY)
            .map(|v| collect_pairs(v, "nome", "valor", |name, amount| CategoryAmount { name, amount }))
            .unwrap_or_default(),
    }
}

/// Wrapped shape first, flat shape second.
fn stats_object(payload: &Value) -> Option<&Map<String, Value>> {
    let top = payload.as_object()?;
    match top.get("data") {
        Some(Value::Object(inner)) => Some(inner),
        _ => Some(top),
    }
}

fn first_number(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| object.get(*k).and_then(coerce_number))
}

fn collect_pairs<T>(
    value: &Value,
    label_key: &str,
    amount_key: &str,
    build: impl Fn(String, f64) -> T,
) -> Vec<T> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let label = item.get(label_key).and_then(Value::as_str);
            let amount = item.get(amount_key).and_then(coerce_number);
            match (label, amount) {
                (Some(label), Some(amount)) => Some(build(label.to_string(), amount)),
                _ => {
                    debug!(index, label_key, amount_key, "dropping incomplete element");
                    None
                }
            }
        })
        .collect()
}

/// JSON numbers and numeric strings; anything else is not a number.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Pull the bearer token out of a login response, top-level or under `data`.
pub fn extract_token(payload: &Value) -> Option<String> {
    let token = payload
        .get("token")
        .or_else(|| payload.get("data").and_then(|d| d.get("token")))?;
    token
        .as_str()
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

pub fn health_status(response: &HttpResponse) -> HealthStatus {
    let payload = ResponseBody::from_response(response);
    HealthStatus {
        status_code: HealthCode::Status(response.status),
        is_json: payload.is_json(),
        payload,
    }
}

pub fn health_failure(error: &TransportError) -> HealthStatus {
    HealthStatus {
        status_code: HealthCode::Err,
        payload: ResponseBody::Text(error.to_string()),
        is_json: false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn wrapped_payload_is_unwrapped() {
        let summary = financial_summary(&json!({
            "success": true,
            "data": {"receitas": 2350.0, "despesas": 1420.5, "saldo": 929.5}
        }));
        assert_eq!(summary.revenue, 2350.0);
        assert_eq!(summary.expenses, 1420.5);
        assert_eq!(summary.balance, 929.5);
    }

    #[test]
    fn flat_payload_is_read_directly() {
        let summary = financial_summary(&json!({"receitas": 10, "despesas": 4, "saldo": 6}));
        assert_eq!(summary.revenue, 10.0);
        assert_eq!(summary.balance, 6.0);
    }

    #[test]
    fn non_object_data_falls_back_to_top_level() {
        let summary = financial_summary(&json!({"data": [1, 2], "receitas": 5}));
        assert_eq!(summary.revenue, 5.0);
    }

    #[test]
    fn missing_balance_is_revenue_minus_expenses() {
        let summary = financial_summary(&json!({"data": {"receitas": 100.25, "despesas": 40.5}}));
        assert_eq!(summary.balance, 100.25 - 40.5);
    }

    #[test]
    fn non_numeric_balance_is_treated_as_missing() {
        let summary = financial_summary(&json!({"receitas": 3, "despesas": 1, "saldo": "n/a"}));
        assert_eq!(summary.balance, 2.0);
    }

    #[test]
    fn monthly_keys_are_used_when_totals_are_absent() {
        let summary = financial_summary(&json!({"data": {
            "receitasMes": 2350.0, "despesasMes": 1420.5, "saldoMes": 929.5
        }}));
        assert_eq!(summary.revenue, 2350.0);
        assert_eq!(summary.expenses, 1420.5);
        assert_eq!(summary.balance, 929.5);
    }

    #[test]
    fn numeric_strings_are_coerced_and_garbage_is_zero() {
        let summary = financial_summary(&json!({"receitas": " 12.5 ", "despesas": "lots"}));
        assert_eq!(summary.revenue, 12.5);
        assert_eq!(summary.expenses, 0.0);
        assert_eq!(summary.balance, 12.5);
    }

    #[test]
    fn null_and_scalars_give_default() {
        for payload in [json!(null), json!(42), json!("text"), json!([1, 2]), json!(true)] {
            assert_eq!(financial_summary(&payload), FinancialSummary::default());
        }
    }

    #[test]
    fn series_elements_missing_fields_are_dropped() {
        let summary = financial_summary(&json!({"data": {"fluxoCaixa": {
            "receitas": [
                {"mes": "Jan", "valor": 2350},
                {"mes": "Dez"},
                {"valor": 10},
                {"mes": 12, "valor": 5},
                "junk",
                {"mes": "Nov", "valor": "1950"}
            ],
            "despesas": {"not": "an array"}
        }}}));
        assert_eq!(
            summary.revenue_by_series,
            vec![
                SeriesPoint { label: "Jan".to_string(), amount: 2350.0 },
                SeriesPoint { label: "Nov".to_string(), amount: 1950.0 },
            ]
        );
        assert!(summary.expenses_by_series.is_empty());
    }

    #[test]
    fn categories_keep_order_and_ignore_extra_fields() {
        let summary = financial_summary(&json!({"categorias": [
            {"nome": "Consultas", "valor": 1200, "percentual": 51},
            {"nome": "Outros", "valor": null},
            {"nome": "Fisioterapia", "valor": 800}
        ]}));
        let names: Vec<&str> = summary.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Consultas", "Fisioterapia"]);
        assert_eq!(summary.categories[1].amount, 800.0);
    }

    #[test]
    fn token_is_found_top_level_or_wrapped() {
        assert_eq!(extract_token(&json!({"token": "t1"})).as_deref(), Some("t1"));
        assert_eq!(extract_token(&json!({"data": {"token": "t2"}})).as_deref(), Some("t2"));
        assert_eq!(extract_token(&json!({"token": 7})), None);
        assert_eq!(extract_token(&json!({"token": ""})), None);
        assert_eq!(extract_token(&json!(null)), None);
    }

    #[test]
    fn health_status_classifies_content_type() {
        let json_response = HttpResponse {
            status: 200,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: r#"{"status":"ok","database":"connected","uptime":12.5}"#.to_string(),
        };
        let status = health_status(&json_response);
        assert_eq!(status.status_code, HealthCode::Status(200));
        assert!(status.is_json);
        assert!(status.is_ok());
        assert_eq!(status.payload.as_json().unwrap()["database"], "connected");

        let html_response = HttpResponse {
            status: 502,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: "<h1>Bad Gateway</h1>".to_string(),
        };
        let status = health_status(&html_response);
        assert_eq!(status.status_code.to_string(), "502");
        assert!(!status.is_json);
        assert_eq!(status.payload, ResponseBody::Text("<h1>Bad Gateway</h1>".to_string()));
    }

    #[test]
    fn health_failure_uses_err_sentinel() {
        let status = health_failure(&TransportError::Connect("dns error".to_string()));
        assert_eq!(status.status_code.to_string(), "ERR");
        assert!(!status.is_json);
        assert_eq!(
            status.payload,
            ResponseBody::Text("connection failed: dns error".to_string())
        );
    }
}
