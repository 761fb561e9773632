//! # Pricing Preview Entry Point
//!
//! ```bash
//! TOURBOOK_GUIDE_ID=… TOURBOOK_DISCOUNT_CODE=welcome10 cargo run -p pricing-preview
//! ```
//!
//! The summary and the JSON breakdown go to stdout; logs and errors go to
//! stderr, errors as `{"code": "...", "message": "..."}`.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    pricing_preview::init_tracing();

    match pricing_preview::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(code = ?err.code, "Preview failed: {}", err);
            eprintln!("{}", err.to_json());
            ExitCode::FAILURE
        }
    }
}
