//! IOU settlement command-line entrypoint.
//!
//! Resolves the payment methods available for one report, prints them, and optionally
//! settles the report through the remote settlement service.
//!
//! Usage: `iou-settle <report.json> [--select <method>] [--settle]`
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `IOU_SESSION_IDENTITY` identifies the payer
//! - `IOU_FLAGS`, `IOU_INSTALLED_APPS` feed the wallet and peer-app checks
//! - `IOU_SETTLEMENT_URL` is where `--settle` posts the request
//! - `RUST_LOG` controls log verbosity

use dotenvy::dotenv;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use iou_settle::controller::SettlementController;
use iou_settle::from_env::{
    flags_from_env, installed_apps_from_env, session_from_env, settlement_url_from_env,
};
use iou_settle::payment_method::PaymentMethod;
use iou_settle::resolver::{PaymentMethodResolver, ResolverConfig};
use iou_settle::settlement_http::HttpSettlementService;
use iou_settle::types::Report;
use settlement_audit::{AuditConfig, AuditLogger};

const USAGE: &str = "usage: iou-settle <report.json> [--select <method>] [--settle]";

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    report_path: String,
    select: Option<PaymentMethod>,
    settle: bool,
}

impl CliArgs {
    fn parse<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut report_path = None;
        let mut select = None;
        let mut settle = false;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--settle" => settle = true,
                "--select" => {
                    let value = args.next().ok_or("--select needs a method")?;
                    select = Some(value.parse::<PaymentMethod>().map_err(|e| e.to_string())?);
                }
                flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
                path if report_path.is_none() => report_path = Some(path.to_string()),
                extra => return Err(format!("unexpected argument {extra}")),
            }
        }

        Ok(Self {
            report_path: report_path.ok_or("missing report path")?,
            select,
            settle,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env variables
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            std::process::exit(2);
        }
    };

    let resolver = PaymentMethodResolver::new(ResolverConfig::from_env()?);
    let session = session_from_env()?;
    let flags = flags_from_env();
    let probe = installed_apps_from_env();
    let service = HttpSettlementService::new(settlement_url_from_env()?);

    let audit_logger = match AuditConfig::from_env() {
        Ok(config) => AuditLogger::new(config),
        Err(e) => {
            tracing::warn!("Failed to load audit config, using defaults: {}", e);
            AuditLogger::default()
        }
    };

    let report: Report = serde_json::from_str(&std::fs::read_to_string(&args.report_path)?)?;
    tracing::info!(
        "Loaded report {} ({} {}) from {}",
        report.report_id,
        report.total,
        report.currency,
        args.report_path
    );

    let controller = SettlementController::new(session, Arc::new(resolver), Arc::new(probe), service)
        .with_audit_logger(Arc::new(audit_logger));
    controller.on_report_ready(report, &flags);
    controller.wait_for_resolutions().await;

    if let Some(method) = args.select {
        controller.select_method(method)?;
    }
    println!("{}", serde_json::to_string_pretty(&controller.view())?);

    if args.settle {
        match controller.settle().await {
            Ok(receipt) => println!("{}", serde_json::to_string_pretty(&receipt)?),
            Err(e) => {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
    }

    controller.dispose();
    Ok(())
}
