use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use testreq_core::config::{bounded_max_comment_len, max_comment_len_from_env_value};
use testreq_core::{
    ActorDirectory, ConsultationDesk, CreateConsultationRequest, FixedAccessGate, IntakeService,
    JsonFileRequestStore, RequestId, RequestStore, TestRequest, WorkflowResult, DEFAULT_DATA_DIR,
};

#[derive(Parser)]
#[command(name = "testreq")]
#[command(about = "Test-request consultation CLI")]
struct Cli {
    /// Directory holding request records (defaults to TESTREQ_DATA_DIR, then "request_data")
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Actor directory YAML (defaults to TESTREQ_ACTORS_FILE)
    #[arg(long, global = true)]
    actors: Option<PathBuf>,
    /// Bearer token of the acting doctor (defaults to TESTREQ_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,
    /// Maximum consultation comment length (defaults to TESTREQ_MAX_COMMENT_LEN, then 2000)
    #[arg(long, global = true)]
    max_comment_len: Option<usize>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import test requests from a YAML seed file
    Import {
        /// Seed file path
        file: PathBuf,
    },
    /// List requests waiting for a doctor
    Queue,
    /// Show one request
    Show { id: u64 },
    /// List requests assigned to the acting doctor
    Mine,
    /// Assign a request to the acting doctor
    Assign { id: u64 },
    /// Record the consultation result and complete the request
    Complete {
        id: u64,
        /// Free-text consultation notes
        #[arg(long)]
        comments: String,
        /// NEGATIVE, NO_ISSUES, HOME_QUARANTINE or ADMIT
        #[arg(long)]
        suggestion: String,
    },
    /// Show the recorded transitions of a request
    Flow { id: u64 },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'testreq --help' for commands");
        return Ok(());
    };

    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var("TESTREQ_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let store: Arc<dyn RequestStore> = Arc::new(JsonFileRequestStore::open(&data_dir)?);

    if let Commands::Import { file } = &command {
        let summary = IntakeService::new(store).import_file(file)?;
        println!(
            "Imported {} request(s), skipped {} already present",
            summary.imported, summary.skipped
        );
        return Ok(());
    }

    let max_comment_len = resolve_max_comment_len(
        cli.max_comment_len,
        std::env::var("TESTREQ_MAX_COMMENT_LEN").ok(),
    )?;

    let gate = resolve_actor(cli.actors, cli.token)?;
    let desk = ConsultationDesk::new(store, max_comment_len);

    match command {
        Commands::Import { .. } => {}
        Commands::Queue => print_list(&desk.in_queue(&gate)?, "No requests waiting."),
        Commands::Mine => print_list(&desk.mine(&gate)?, "No requests assigned to you."),
        Commands::Show { id } => {
            let record = desk.show(&gate, RequestId::new(id))?;
            print_summary(&record);
            if let Some(lab) = &record.lab_result {
                println!(
                    "  Lab: {:?}, BP {}, HR {}, T {}, SpO2 {}",
                    lab.result, lab.blood_pressure, lab.heart_beat, lab.temperature, lab.oxygen_level
                );
            }
            if let Some(c) = &record.consultation {
                println!(
                    "  Consultation by {}: {} ({})",
                    c.doctor, c.suggestion, c.comments
                );
            }
        }
        Commands::Assign { id } => {
            let record = desk.assign(&gate, RequestId::new(id))?;
            println!("Assigned request {} to actor {}", record.id, gate.0.id);
        }
        Commands::Complete {
            id,
            comments,
            suggestion,
        } => {
            let payload = CreateConsultationRequest::new(comments, suggestion);
            let record = desk.update(&gate, RequestId::new(id), &payload)?;
            println!("Completed request {}", record.id);
        }
        Commands::Flow { id } => {
            let flows = desk.flow(&gate, RequestId::new(id))?;
            if flows.is_empty() {
                println!("No transitions recorded.");
            }
            for f in flows {
                println!(
                    "{} {} -> {} by {}",
                    f.happened_on.to_rfc3339(),
                    f.from,
                    f.to,
                    f.changed_by
                );
            }
        }
    }

    Ok(())
}

/// The `--max-comment-len` flag wins over the environment value; both go through the same
/// bounds as the server.
fn resolve_max_comment_len(flag: Option<usize>, env_value: Option<String>) -> WorkflowResult<usize> {
    let max_comment_len = match flag {
        Some(n) => n,
        None => max_comment_len_from_env_value(env_value)?,
    };
    bounded_max_comment_len(max_comment_len)
}

fn resolve_actor(
    actors: Option<PathBuf>,
    token: Option<String>,
) -> Result<FixedAccessGate, Box<dyn std::error::Error>> {
    let actors = actors
        .or_else(|| std::env::var("TESTREQ_ACTORS_FILE").ok().map(PathBuf::from))
        .ok_or("an actor file is required (--actors or TESTREQ_ACTORS_FILE)")?;
    let token = token
        .or_else(|| std::env::var("TESTREQ_TOKEN").ok())
        .ok_or("a bearer token is required (--token or TESTREQ_TOKEN)")?;

    let directory = ActorDirectory::load(Path::new(&actors))?;
    let actor = directory
        .resolve(&token)
        .cloned()
        .ok_or("unknown token")?;
    Ok(FixedAccessGate(actor))
}

fn print_list(records: &[TestRequest], empty: &str) {
    if records.is_empty() {
        println!("{empty}");
    }
    for record in records {
        print_summary(record);
    }
}

fn print_summary(record: &TestRequest) {
    let doctor = record
        .assigned_doctor
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".into());
    println!(
        "ID: {}, Patient: {}, Status: {}, Doctor: {}, Modified: {}",
        record.id,
        record.patient.name,
        record.status,
        doctor,
        record.last_modified.to_rfc3339()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use testreq_core::constants::{DEFAULT_MAX_COMMENT_LEN, MAX_COMMENT_LEN_CEILING};

    #[test]
    fn comment_limit_follows_flag_then_environment() {
        assert_eq!(
            resolve_max_comment_len(None, None).unwrap(),
            DEFAULT_MAX_COMMENT_LEN
        );
        assert_eq!(resolve_max_comment_len(None, Some("50".into())).unwrap(), 50);
        assert_eq!(
            resolve_max_comment_len(Some(10), Some("50".into())).unwrap(),
            10
        );
    }

    #[test]
    fn comment_limit_is_bounded_like_the_server() {
        assert!(resolve_max_comment_len(Some(0), None).is_err());
        assert!(resolve_max_comment_len(None, Some("0".into())).is_err());
        assert!(resolve_max_comment_len(Some(MAX_COMMENT_LEN_CEILING + 1), None).is_err());
        assert!(resolve_max_comment_len(None, Some("abc".into())).is_err());
    }
}
