// src/main.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use payroll_desk::models::{ComponentKind, ResultId, ResultStatus, RunId, UploadFile};
use payroll_desk::workflow::{
    breakdown, disposition, format_currency, history, row_controls, AdapterState, Provenance,
    RowControls, UploadTarget, GENERATE_FAILED,
};
use payroll_desk::{server, DeskConfig, DeskError, HttpBackend, Ledger, Workbench};

#[derive(Parser, Debug)]
#[command(author, version, about = "payroll-desk: review, approve and archive payroll runs")]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the in-memory development backend.
    Serve,
    /// List the working set.
    Results {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<ResultStatus>,
    },
    /// Ask the service to calculate a fresh working set.
    Generate,
    Approve { id: ResultId },
    Reject {
        id: ResultId,
        #[arg(long)]
        reason: String,
    },
    /// Show the incentive or deduction lines behind a result.
    Breakdown { id: ResultId, kind: ComponentKind },
    /// Snapshot the whole working set into history.
    Archive {
        #[arg(long, default_value = "")]
        name: String,
    },
    /// List archived runs, optionally opening one.
    History {
        #[arg(long)]
        open: Option<RunId>,
    },
    /// Permanently delete an archived run.
    DeleteRun {
        id: RunId,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    Employees {
        #[arg(long)]
        search: Option<String>,
    },
    UploadEmployees { file: PathBuf },
    UploadComponents {
        #[arg(long)]
        kind: ComponentKind,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Add a one-off incentive for an employee.
    ManualAdd {
        #[arg(long)]
        employee: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        remark: String,
        #[arg(long)]
        attachment: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "payroll_desk=debug,tower_http=debug"
    } else {
        "payroll_desk=info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn read_upload(path: &Path) -> anyhow::Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".into());
    Ok(UploadFile { name, bytes })
}

fn fail(err: &DeskError, fallback: &str) -> anyhow::Error {
    let msg = err.user_message(fallback);
    if msg.is_empty() {
        anyhow::anyhow!("{err}")
    } else {
        anyhow::anyhow!(msg)
    }
}

fn generic(err: &DeskError, notice: &str) -> anyhow::Error {
    if !err.is_validation() {
        warn!(error = %err, "{notice}");
    }
    anyhow::anyhow!(err.notice(notice))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_upload(desk: &Workbench<HttpBackend>, target: UploadTarget, state: AdapterState) -> anyhow::Result<()> {
    let status = desk.upload_card(target).status();
    println!("{}", status.message());
    for w in status.warnings() {
        println!("  ! {w}");
    }
    if state == AdapterState::Error {
        bail!("upload failed");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = DeskConfig::from_env();

    if let Commands::Serve = cli.command {
        return server::serve(&config, Arc::new(Ledger::new())).await;
    }

    let backend = Arc::new(HttpBackend::new(config.clone())?);
    let mut desk = Workbench::new(backend, config);
    desk.mount().await;

    match cli.command {
        Commands::Serve => unreachable!("handled above"),
        Commands::Results { search, status } => {
            if let Some(s) = search {
                desk.set_search(&s).await;
            }
            if status.is_some() {
                desk.set_status_filter(status).await;
            }
            if cli.json {
                return print_json(&desk.results());
            }
            println!(
                "{:>5}  {:<10} {:<22} {:>12} {:>12} {:>12} {:>12}  {:<9} ACTION",
                "ID", "EMP ID", "NAME", "BASE", "INCENTIVES", "DEDUCTIONS", "FINAL", "STATUS"
            );
            for r in desk.results() {
                let action = match row_controls(r) {
                    RowControls::Decide => "approve / reject".to_string(),
                    RowControls::Locked => "Locked".to_string(),
                    RowControls::RejectedWith(reason) => format!("Reason: {reason}"),
                };
                println!(
                    "{:>5}  {:<10} {:<22} {:>12} {:>12} {:>12} {:>12}  {:<9} {}",
                    r.id,
                    r.employee.employee_id,
                    r.employee.name,
                    format_currency(r.employee.base_salary),
                    format_currency(r.total_incentives),
                    format_currency(r.total_deductions),
                    format_currency(r.final_salary),
                    r.status,
                    action
                );
            }
        }
        Commands::Generate => {
            let msg = desk.generate().await.map_err(|e| fail(&e, GENERATE_FAILED))?;
            println!("{msg}");
            println!("{} result(s) pending review.", desk.results().len());
        }
        Commands::Approve { id } => {
            desk.approve(id).await.map_err(|e| generic(&e, disposition::ACTION_FAILED))?;
            println!("Result {id} approved.");
        }
        Commands::Reject { id, reason } => {
            desk.edit_reason(id, &reason);
            desk.reject(id).await.map_err(|e| generic(&e, disposition::ACTION_FAILED))?;
            println!("Result {id} rejected.");
        }
        Commands::Breakdown { id, kind } => {
            let Some(result) = desk.store().get(id) else {
                bail!("Payroll result {id} is not in the working set.");
            };
            let lines = breakdown(result, kind, desk.config());
            if lines.is_empty() {
                println!("No specific items to display.");
            }
            for line in lines {
                println!("{:<30} {:>12}", line.reason, line.amount);
                match line.provenance {
                    Provenance::Attachment(url) => println!("    proof: {url}"),
                    Provenance::SourceFile { name, url } => println!("    source: {name} <{url}>"),
                    Provenance::Text(text) => println!("    source: {text}"),
                    Provenance::None => {}
                }
            }
        }
        Commands::Archive { name } => {
            desk.open_archive().await.map_err(|e| fail(&e, ""))?;
            desk.set_archive_name(&name).map_err(|e| fail(&e, ""))?;
            let msg = desk
                .confirm_archive()
                .await
                .map_err(|e| fail(&e, payroll_desk::workflow::archive::ARCHIVE_FAILED))?;
            println!("{msg}");
        }
        Commands::History { open } => {
            if let Some(run_id) = open {
                desk.toggle_run(run_id).await;
            }
            if cli.json {
                return match open {
                    Some(_) => print_json(&desk.history().details()),
                    None => print_json(&desk.history().runs()),
                };
            }
            if desk.history().runs().is_empty() {
                println!("No historical payroll runs found.");
            }
            for run in desk.history().runs() {
                let marker = if desk.history().active_run_id() == Some(run.id) { "v" } else { ">" };
                println!("{marker} [{}] {}", run.id, run.label());
                if desk.history().active_run_id() == Some(run.id) {
                    for r in desk.history().details() {
                        println!(
                            "    {:<10} {:<22} {:>12} {:>12} {:>12} {:>12}  {}",
                            r.employee_id,
                            r.employee_name,
                            format_currency(r.base_salary),
                            format_currency(r.total_incentives),
                            format_currency(r.total_deductions),
                            format_currency(r.final_salary),
                            r.status
                        );
                    }
                }
            }
        }
        Commands::DeleteRun { id, yes } => {
            let confirmation = desk.request_delete_run(id).map_err(|e| fail(&e, ""))?;
            if !yes {
                println!("{} ({})", confirmation.prompt(), confirmation.label());
                bail!("not deleted: re-run with --yes to confirm");
            }
            let msg = desk
                .confirm_delete_run(confirmation)
                .await
                .map_err(|e| generic(&e, history::DELETE_FAILED))?;
            println!("{msg}");
        }
        Commands::Employees { search } => {
            desk.manual_entry_mut().picker_search = search.unwrap_or_default();
            let visible = desk.manual_entry().visible_employees();
            if cli.json {
                return print_json(&visible);
            }
            for e in visible {
                println!("{:<10} {:<22} {:>12}", e.employee_id, e.name, format_currency(e.base_salary));
            }
        }
        Commands::UploadEmployees { file } => {
            let upload = read_upload(&file).await?;
            let target = UploadTarget::EmployeeMaster;
            let state = desk.upload(target, vec![upload]).await.map_err(|e| fail(&e, ""))?;
            report_upload(&desk, target, state)?;
        }
        Commands::UploadComponents { kind, files } => {
            let mut uploads = Vec::with_capacity(files.len());
            for f in &files {
                uploads.push(read_upload(f).await?);
            }
            let target = UploadTarget::Components(kind);
            let state = desk.upload(target, uploads).await.map_err(|e| fail(&e, ""))?;
            report_upload(&desk, target, state)?;
        }
        Commands::ManualAdd { employee, amount, remark, attachment } => {
            let attachment = match attachment {
                Some(p) => Some(read_upload(&p).await?),
                None => None,
            };
            let form = desk.manual_entry_mut();
            form.selected_employee = Some(employee);
            form.amount = amount;
            form.remark = remark;
            form.attachment = attachment;
            let state = desk.submit_manual_entry().await.map_err(|e| fail(&e, ""))?;
            println!("{}", desk.manual_entry().status().message());
            if state == AdapterState::Error {
                bail!("manual entry failed");
            }
        }
    }
    Ok(())
}
