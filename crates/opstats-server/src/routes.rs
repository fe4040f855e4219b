//! Route table for the opstats API.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::{handlers, AppState};

/// Upload body size cap; a 10,000-row CSV stays well under this.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/csv/upload", post(handlers::upload))
        .route("/api/results/filter", get(handlers::filter_results))
        .route(
            "/api/results/last/:file_name",
            get(handlers::latest_measurements),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use opstats_data::store::Store;
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "opstats-test-boundary";

    const VALID_CSV: &str = "Timestamp,ExecutionTime,IndicatorValue\n\
                             2023-01-01T12:00:00,1.5,10.2\n\
                             2023-01-01T12:01:00,2.3,15.7\n";

    async fn app() -> Router {
        let store = Store::connect_in_memory().await.expect("store");
        router(AppState { store })
    }

    fn upload_request(file_name: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/csv/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    #[tokio::test]
    async fn test_upload_then_read_back() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(upload_request("test.csv", VALID_CSV))
            .await
            .expect("upload");
        assert_eq!(response.status(), StatusCode::OK);
        let ack: Value = serde_json::from_str(&body_string(response).await).expect("json ack");
        assert_eq!(ack["message"], "File processed successfully");
        assert_eq!(ack["fileName"], "test");

        let response = app
            .clone()
            .oneshot(get_request("/api/results/filter"))
            .await
            .expect("filter");
        assert_eq!(response.status(), StatusCode::OK);
        let results: Value = serde_json::from_str(&body_string(response).await).expect("json");
        assert_eq!(results.as_array().map(Vec::len), Some(1));
        assert_eq!(results[0]["fileName"], "test");
        assert_eq!(results[0]["totalTimeSpanSeconds"], 60.0);

        let response = app
            .oneshot(get_request("/api/results/last/test"))
            .await
            .expect("last");
        assert_eq!(response.status(), StatusCode::OK);
        let rows: Value = serde_json::from_str(&body_string(response).await).expect("json");
        assert_eq!(rows.as_array().map(Vec::len), Some(2));
        // Newest first.
        assert_eq!(rows[0]["indicatorValue"], 15.7);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_csv_extension() {
        let response = app()
            .await
            .oneshot(upload_request("data.txt", VALID_CSV))
            .await
            .expect("upload");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Only CSV files are allowed");
    }

    #[tokio::test]
    async fn test_upload_rejects_missing_file() {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"note\"\r\n\r\n\
             hello\r\n\
             --{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/csv/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request");

        let response = app().await.oneshot(request).await.expect("upload");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "No file uploaded");
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_file() {
        let response = app()
            .await
            .oneshot(upload_request("empty.csv", ""))
            .await
            .expect("upload");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "No file uploaded");
    }

    #[tokio::test]
    async fn test_upload_returns_structured_validation_errors() {
        let csv = "Timestamp,ExecutionTime,IndicatorValue\n\
                   1999-12-31T23:59:59,-1.5,-10.2\n";
        let response = app()
            .await
            .oneshot(upload_request("invalid.csv", csv))
            .await
            .expect("upload");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = serde_json::from_str(&body_string(response).await).expect("json");
        let errors = body["errors"].as_array().expect("errors array");
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[1], "Row 1: Execution time cannot be negative");
    }

    #[tokio::test]
    async fn test_upload_reports_row_count_violation() {
        let response = app()
            .await
            .oneshot(upload_request(
                "headeronly.csv",
                "Timestamp,ExecutionTime,IndicatorValue\n",
            ))
            .await
            .expect("upload");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            "Invalid row count: 0. Must be between 1-10000"
        );
    }

    #[tokio::test]
    async fn test_upload_reports_parse_error() {
        let csv = "Timestamp,ExecutionTime,IndicatorValue\n\
                   2023-01-01T12:00:00,not-a-number,1.0\n";
        let response = app()
            .await
            .oneshot(upload_request("bad.csv", csv))
            .await
            .expect("upload");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.starts_with("Error parsing CSV:"));
    }

    #[tokio::test]
    async fn test_filter_with_query_params() {
        let app = app().await;
        app.clone()
            .oneshot(upload_request("alpha.csv", VALID_CSV))
            .await
            .expect("upload alpha");
        app.clone()
            .oneshot(upload_request(
                "beta.csv",
                "Timestamp,ExecutionTime,IndicatorValue\n2023-06-01T00:00:00,4.0,40.0\n",
            ))
            .await
            .expect("upload beta");

        let response = app
            .clone()
            .oneshot(get_request(
                "/api/results/filter?fileName=alp&startDate=2023-01-01&maxAvgValue=20",
            ))
            .await
            .expect("filter");
        assert_eq!(response.status(), StatusCode::OK);
        let results: Value = serde_json::from_str(&body_string(response).await).expect("json");
        assert_eq!(results.as_array().map(Vec::len), Some(1));
        assert_eq!(results[0]["fileName"], "alpha");

        // No criteria matches everything.
        let response = app
            .oneshot(get_request("/api/results/filter"))
            .await
            .expect("filter all");
        let results: Value = serde_json::from_str(&body_string(response).await).expect("json");
        assert_eq!(results.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_latest_for_unknown_file_is_empty_array() {
        let response = app()
            .await
            .oneshot(get_request("/api/results/last/unknown"))
            .await
            .expect("last");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "[]");
    }
}
