use clap::{Parser, Subcommand};
use medchat_core::config::max_records_from_env_value;
use medchat_core::validation::validate_question;
use medchat_core::{
    AssistantService, PatientError, PatientId, PatientRecords, PatientResult, PromptBuilder,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "medchat")]
#[command(about = "MedChat patient-record assistant CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a patient's records and print them as JSON
    Fetch {
        /// Patient identifier
        patient_id: String,
    },
    /// Print the prompt that would be sent for a question
    Prompt {
        /// Patient identifier
        patient_id: String,
        /// Question about the patient's records
        question: String,
        /// Read records from a JSON file (same shape as `/fetch`) instead of the store
        #[arg(long)]
        records: Option<PathBuf>,
    },
    /// Ask a question about a patient's records
    Ask {
        /// Patient identifier
        patient_id: String,
        /// Question about the patient's records
        question: String,
    },
    /// Check whether a patient exists
    Check {
        /// Patient identifier
        patient_id: String,
    },
}

/// Reads records from a JSON file; missing or `null` collections are empty.
fn read_records_file(path: &Path) -> PatientResult<PatientRecords> {
    let contents = std::fs::read_to_string(path).map_err(PatientError::FileRead)?;
    serde_json::from_str(&contents).map_err(PatientError::Deserialization)
}

fn assistant() -> Result<AssistantService, Box<dyn std::error::Error>> {
    let cfg = api_shared::load_core_config()?;
    Ok(AssistantService::from_config(&cfg)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Fetch { patient_id }) => {
            let patient_id = PatientId::parse(&patient_id)?;
            match assistant()?.fetch_records(&patient_id).await {
                Ok(records) => {
                    let json =
                        serde_json::to_string_pretty(&records).map_err(PatientError::Serialization)?;
                    println!("{}", json);
                }
                Err(e) => eprintln!("Error fetching records: {}", e),
            }
        }
        Some(Commands::Prompt {
            patient_id,
            question,
            records,
        }) => {
            let patient_id = PatientId::parse(&patient_id)?;
            let question = validate_question(&question)?;
            match records {
                Some(path) => {
                    let builder = PromptBuilder::new(max_records_from_env_value(
                        std::env::var("PROMPT_MAX_RECORDS").ok(),
                    )?);
                    let records = read_records_file(&path)?;
                    println!("{}", builder.build(&patient_id, &question, &records));
                }
                None => {
                    let assistant = assistant()?;
                    match assistant.fetch_records(&patient_id).await {
                        Ok(records) => println!(
                            "{}",
                            assistant.preview_prompt(&patient_id, &question, &records)
                        ),
                        Err(e) => eprintln!("Error fetching records: {}", e),
                    }
                }
            }
        }
        Some(Commands::Ask {
            patient_id,
            question,
        }) => {
            let patient_id = PatientId::parse(&patient_id)?;
            let question = validate_question(&question)?;
            match assistant()?.ask(&patient_id, &question).await {
                Ok(answer) => {
                    println!("{}", answer.text);
                    eprintln!("(based on {})", answer.counts);
                }
                Err(e) => eprintln!("Error answering question: {}", e),
            }
        }
        Some(Commands::Check { patient_id }) => {
            let patient_id = PatientId::parse(&patient_id)?;
            match assistant()?.patient_exists(&patient_id).await {
                Ok(true) => println!("Patient {} exists.", patient_id),
                Ok(false) => println!("No patient found with ID {}.", patient_id),
                Err(e) => eprintln!("Error checking patient: {}", e),
            }
        }
        None => {
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
