use serde::Serialize;
use serde_json::json;

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", to_pretty(&err));
    std::process::exit(1);
}

/// Pretty JSON, or a plain error object if serialization itself fails.
pub fn to_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\":\"cli_error\",\"message\":\"{e}\"}}"))
}

pub fn print_json<T: Serialize>(value: &T, raw: bool) {
    let formatted = if raw {
        serde_json::to_string(value).unwrap_or_else(|_| to_pretty(value))
    } else {
        to_pretty(value)
    };
    println!("{formatted}");
}

/// Execute an API request, print the response, and return an exit code.
///
/// Exit codes: 0=success (2xx), 1=client error (4xx), 2=server error (5xx),
///             3=connection error, 4=usage error
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    body: Option<serde_json::Value>,
    raw: bool,
) -> i32 {
    let url = match reqwest::Url::parse(&format!("{api_url}{path}")) {
        Ok(u) => u,
        Err(e) => {
            let err = json!({
                "error": "cli_error",
                "message": format!("Invalid URL: {api_url}{path}: {e}")
            });
            eprintln!("{}", to_pretty(&err));
            return 4;
        }
    };

    let mut req = client().request(method, url);
    if let Some(b) = body {
        req = req.json(&b);
    }

    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            let err = json!({
                "error": "connection_error",
                "message": format!("{e}"),
                "docs_hint": "Is the API server running? Check DOST_API_URL."
            });
            eprintln!("{}", to_pretty(&err));
            return 3;
        }
    };

    let status = resp.status().as_u16();
    let exit_code = exit_code_for(status);

    // DELETE answers 204 with no body
    let text = resp.text().await.unwrap_or_default();
    let resp_body: serde_json::Value = if text.trim().is_empty() {
        json!({ "status": status })
    } else {
        serde_json::from_str(&text).unwrap_or_else(
            |e| json!({"raw_error": format!("Failed to parse response as JSON: {e}")}),
        )
    };

    if exit_code == 0 {
        print_json(&resp_body, raw);
    } else {
        eprintln!("{}", to_pretty(&resp_body));
    }

    exit_code
}

fn exit_code_for(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::exit_code_for;

    #[test]
    fn maps_status_classes_to_exit_codes() {
        assert_eq!(exit_code_for(204), 0);
        assert_eq!(exit_code_for(404), 1);
        assert_eq!(exit_code_for(503), 2);
    }
}
