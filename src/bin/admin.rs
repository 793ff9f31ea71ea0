use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use gst_reconciler::api::types::IngestResponse;
use gst_reconciler::crypto::sha256_hex;
use gst_reconciler::domain::{ExplainRequest, PlanTier, ReconciliationStatus, TenantId};
use gst_reconciler::infra::{explainer_from_config, InMemoryTenantStore, IngestService};
use gst_reconciler::report::{build_report, render_report};
use gst_reconciler::server::Config;

fn print_help() {
    eprintln!(
        "\
gst-reconciler-admin

USAGE:
  gst-reconciler-admin <command> [options]

COMMANDS:
  reconcile                       Reconcile a CSV batch and print the results
  report                          Build the GST risk report for a CSV batch
  explain                         Explain one reconciliation outcome
  hash                            Print the SHA-256 of a file

reconcile OPTIONS:
  --input <path>                  (required) CSV file
  --plan <BASIC|PRO|ENTERPRISE>   (default: BASIC)
  --tenant-id <id>                (default: local)

report OPTIONS:
  --input <path>                  (required) CSV file
  --plan <BASIC|PRO|ENTERPRISE>   (default: BASIC)
  --tenant-id <id>                (default: local)
  --pdf <path>                    (optional) Also write the PDF rendering

explain OPTIONS:
  --invoice-number <s>            (required)
  --gstin <s>                     (required)
  --status <STATUS>               (required) MATCHED, PARTIAL_MATCH, MISSING_IN_2B or RISKY_ITC
  (uses EXPLAIN_API_KEY / OPENAI_API_KEY when set, otherwise the fallback)

hash OPTIONS:
  --input <path>                  (required)
"
    );
}

fn next_value(args: &mut VecDeque<String>, flag: &str) -> anyhow::Result<String> {
    args.pop_front()
        .ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))
}

fn parse_tenant(raw: &str) -> anyhow::Result<TenantId> {
    TenantId::parse(raw).ok_or_else(|| anyhow::anyhow!("--tenant-id must not be blank"))
}

struct BatchArgs {
    input: PathBuf,
    plan: PlanTier,
    tenant_id: TenantId,
    pdf: Option<PathBuf>,
}

fn parse_batch_args(args: &mut VecDeque<String>, allow_pdf: bool) -> anyhow::Result<Option<BatchArgs>> {
    let mut input: Option<PathBuf> = None;
    let mut plan = PlanTier::default();
    let mut tenant_id = parse_tenant("local")?;
    let mut pdf: Option<PathBuf> = None;

    while let Some(arg) = args.pop_front() {
        match arg.as_str() {
            "--input" => input = Some(next_value(args, "--input")?.into()),
            "--plan" => {
                plan = next_value(args, "--plan")?
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!(e))?;
            }
            "--tenant-id" => tenant_id = parse_tenant(&next_value(args, "--tenant-id")?)?,
            "--pdf" if allow_pdf => pdf = Some(next_value(args, "--pdf")?.into()),
            "-h" | "--help" => {
                print_help();
                return Ok(None);
            }
            other => anyhow::bail!("unexpected argument: {other}"),
        }
    }

    let input = input.ok_or_else(|| anyhow::anyhow!("--input is required"))?;
    Ok(Some(BatchArgs {
        input,
        plan,
        tenant_id,
        pdf,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args: VecDeque<String> = std::env::args().skip(1).collect();
    let Some(command) = args.pop_front() else {
        print_help();
        return Ok(());
    };

    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_help();
        return Ok(());
    }

    match command.as_str() {
        "reconcile" => {
            let Some(batch) = parse_batch_args(&mut args, false)? else {
                return Ok(());
            };
            let body = std::fs::read(&batch.input)?;
            let ingest = IngestService::new(Arc::new(InMemoryTenantStore::new()));
            let record = ingest.ingest_csv(&batch.tenant_id, batch.plan, &body)?;

            println!(
                "{}",
                serde_json::to_string_pretty(&IngestResponse::from(&*record))?
            );
            Ok(())
        }
        "report" => {
            let Some(batch) = parse_batch_args(&mut args, true)? else {
                return Ok(());
            };
            let body = std::fs::read(&batch.input)?;
            let ingest = IngestService::new(Arc::new(InMemoryTenantStore::new()));
            let record = ingest.ingest_csv(&batch.tenant_id, batch.plan, &body)?;
            let report = build_report(&record)?;

            if let Some(path) = batch.pdf {
                let document = render_report(&report)?;
                std::fs::write(&path, &document.bytes)?;
                eprintln!(
                    "ok: wrote {} ({} bytes, sha256 {})",
                    path.display(),
                    document.bytes.len(),
                    document.sha256
                );
            }

            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        "explain" => {
            let mut invoice_number: Option<String> = None;
            let mut gstin: Option<String> = None;
            let mut status: Option<ReconciliationStatus> = None;

            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--invoice-number" => {
                        invoice_number = Some(next_value(&mut args, "--invoice-number")?)
                    }
                    "--gstin" => gstin = Some(next_value(&mut args, "--gstin")?),
                    "--status" => {
                        let raw = next_value(&mut args, "--status")?;
                        status = Some(serde_json::from_value(serde_json::Value::String(raw))?);
                    }
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let request = ExplainRequest {
                invoice_number: invoice_number
                    .ok_or_else(|| anyhow::anyhow!("--invoice-number is required"))?,
                gstin: gstin.ok_or_else(|| anyhow::anyhow!("--gstin is required"))?,
                status: status.ok_or_else(|| anyhow::anyhow!("--status is required"))?,
                factual_diffs: Default::default(),
            };

            let explainer = explainer_from_config(Config::from_env()?.explainer);
            let response = explainer.explain(&request).await;
            eprintln!("provider: {}", explainer.name());
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        "hash" => {
            let mut input: Option<PathBuf> = None;
            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--input" => input = Some(next_value(&mut args, "--input")?.into()),
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let input = input.ok_or_else(|| anyhow::anyhow!("--input is required"))?;
            println!("{}", sha256_hex(&std::fs::read(input)?));
            Ok(())
        }
        other => {
            print_help();
            anyhow::bail!("unknown command: {other}")
        }
    }
}
