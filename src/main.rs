use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use clap::{Parser, Subcommand};
use morpho_adapters::HistoAnalysisLoader;
use morpho_core::{ResultLoader, RunState};
use morpho_study::{Selection, StatusBoard, StatusChange, Study, StudyRunner};
use morphoflow::{images_in, AppError, Workspace};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "morphoflow", version, about = "Multi-subject T1 analysis studies")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crea un estudio vacío (o abre un directorio ya organizado).
    New {
        name: String,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        analysis_type: Option<String>,
        #[arg(long)]
        template: Option<String>,
        /// Descubre los sujetos ya presentes en `output_dir`.
        #[arg(long)]
        from_directory: bool,
    },
    /// Agrega una o más imágenes como sujetos.
    Add {
        study: String,
        #[arg(required = true)]
        images: Vec<PathBuf>,
        #[arg(long)]
        group: Option<String>,
        /// Usa las imágenes en su sitio, sin copiarlas al estudio.
        #[arg(long)]
        no_import: bool,
    },
    /// Agrega todas las imágenes de un directorio.
    ImportDir {
        study: String,
        dir: PathBuf,
        #[arg(long)]
        group: Option<String>,
    },
    Remove {
        study: String,
        subject: String,
        #[arg(long)]
        delete_files: bool,
    },
    /// Muestra el estudio o un sujeto.
    ///
    /// Los estados se derivan sólo de los archivos de salida: "is running" y
    /// "last run failed" sólo los informa `run` mientras ejecuta.
    Show {
        study: String,
        subject: Option<String>,
        /// Imprime el árbol persistido tal cual.
        #[arg(long)]
        json: bool,
    },
    /// Ejecuta los sujetos seleccionados (todos por defecto) hasta terminar.
    Run {
        study: String,
        #[arg(long = "subject")]
        subjects: Vec<String>,
        /// Borra los resultados existentes antes de lanzar.
        #[arg(long)]
        clear: bool,
        #[arg(long)]
        simulate: bool,
    },
    /// Estado de cada sujeto según sus archivos de salida.
    ///
    /// Sin ejecución en este proceso no hay "is running" ni "last run failed";
    /// `run` imprime esos cambios mientras ejecuta.
    Status {
        study: String,
        /// Sigue imprimiendo los cambios en cada tick.
        #[arg(long)]
        watch: bool,
    },
    Clear {
        study: String,
        subjects: Vec<String>,
    },
}

fn selection(subjects: Vec<String>) -> Selection {
    if subjects.is_empty() {
        Selection::All
    } else {
        Selection::Only(subjects)
    }
}

fn print_change(change: &StatusChange) {
    println!("{:<30} {}", change.subject_id, change.current);
}

fn show(study: &Study, subject: Option<&str>, runner: &StudyRunner) -> Result<(), AppError> {
    println!("study      {}", study.name());
    println!("outputdir  {}", study.output_dir().display());
    println!("analysis   {} ({})", study.analysis_type(), study.parameter_template());
    let Some(id) = subject else {
        for id in study.subject_ids() {
            println!("  {:<28} {}", id, runner.status(study, id)?);
        }
        return Ok(());
    };
    let analysis = study.analysis(id)
                        .ok_or_else(|| morpho_study::StudyError::UnknownSubject(id.to_string()))?;
    println!("subject    {id}");
    for (title, params) in [("inputs", analysis.inputs()), ("outputs", analysis.outputs())] {
        println!("{title}:");
        for (name, value) in params.iter() {
            let value = value.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
            println!("  {name:<24} {value}");
        }
    }
    match analysis.commands() {
        Ok(commands) => {
            println!("commands:");
            for c in commands {
                println!("  {c}");
            }
        }
        Err(e) => println!("commands: {e}"),
    }
    if let Ok(Some(han)) = analysis.finished_output("histo_analysis") {
        match HistoAnalysisLoader.load(&han) {
            Ok(h) => println!("histogram  gray {:.1}±{:.1}  white {:.1}±{:.1}",
                              h.gray.mean, h.gray.std, h.white.mean, h.white.std),
            Err(e) => println!("histogram  {e}"),
        }
    }
    Ok(())
}

fn execute(ws: &Workspace, command: Command) -> Result<(), AppError> {
    match command {
        Command::New { name,
                       output_dir,
                       analysis_type,
                       template,
                       from_directory, } => {
            let study = ws.create_study(&name,
                                        output_dir,
                                        analysis_type.as_deref(),
                                        template.as_deref(),
                                        from_directory)?;
            println!("created study '{}' with {} subjects at {}",
                     study.name(),
                     study.len(),
                     study.backup_filename().display());
        }
        Command::Add { study: locator,
                       images,
                       group,
                       no_import, } => {
            let mut study = ws.open(&locator)?;
            for (img, result) in ws.add_images(&mut study, &images, group.as_deref(), !no_import) {
                match result {
                    Ok(id) => println!("added {id}"),
                    Err(e) => eprintln!("{}: {e}", img.display()),
                }
            }
            ws.save(&study)?;
        }
        Command::ImportDir { study: locator, dir, group } => {
            let mut study = ws.open(&locator)?;
            let images = images_in(&dir)?;
            let added = ws.add_images(&mut study, &images, group.as_deref(), true)
                          .into_iter()
                          .filter(|(_, r)| r.is_ok())
                          .count();
            println!("added {added} of {} images", images.len());
            ws.save(&study)?;
        }
        Command::Remove { study: locator,
                          subject,
                          delete_files, } => {
            let mut study = ws.open(&locator)?;
            if delete_files {
                study.remove_subject_and_files(&subject)?;
            } else {
                study.remove_subject(&subject)?;
            }
            ws.save(&study)?;
            println!("removed {subject}");
        }
        Command::Show { study: locator, subject, json } => {
            let study = ws.open(&locator)?;
            if json {
                println!("{:#}", study.serialize());
            } else {
                let runner = StudyRunner::new(ws.engine(true));
                show(&study, subject.as_deref(), &runner)?;
            }
        }
        Command::Run { study: locator,
                       subjects,
                       clear,
                       simulate, } => {
            let study = ws.open(&locator)?;
            let selection = selection(subjects);
            if clear {
                let removed = study.clear_results(&selection)?;
                println!("cleared {removed} files");
            }
            let runner = StudyRunner::new(ws.engine(simulate));
            let report = runner.run(&study, &selection)?;
            for (id, e) in &report.rejected {
                eprintln!("{id}: {e}");
            }
            let mut board = StatusBoard::new();
            board.subscribe(Box::new(print_change));
            board.tick(&study, &runner)?;
            while runner.any_running() {
                thread::sleep(ws.config().poll_interval);
                board.tick(&study, &runner)?;
            }
            for (id, state) in runner.wait_all() {
                if state == RunState::Failed {
                    if let Some(f) = runner.last_failure(&id) {
                        eprintln!("{id}: step '{}' failed ({:?}): {}", f.step_id, f.exit_code, f.diagnostic);
                    }
                }
            }
            board.tick(&study, &runner)?;
        }
        Command::Status { study: locator, watch } => {
            let study = ws.open(&locator)?;
            let runner = StudyRunner::new(ws.engine(true));
            let mut board = StatusBoard::new();
            board.subscribe(Box::new(print_change));
            board.tick(&study, &runner)?;
            while watch {
                thread::sleep(ws.config().poll_interval);
                board.tick(&study, &runner)?;
            }
        }
        Command::Clear { study: locator, subjects } => {
            let study = ws.open(&locator)?;
            let removed = study.clear_results(&selection(subjects))?;
            println!("cleared {removed} files");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("MORPHO_LOG").or_else(|_| EnvFilter::try_from_default_env())
                                                      .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    let result = Workspace::from_env().and_then(|ws| execute(&ws, cli.command));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn file_only_commands_say_so() {
        let mut cli = Cli::command();
        for name in ["status", "show"] {
            let sub = cli.find_subcommand_mut(name).unwrap();
            let help = sub.render_long_help().to_string();
            assert!(help.contains("is running"), "{name}: {help}");
        }
    }

    #[test]
    fn run_collects_repeated_subjects() {
        let cli = Cli::try_parse_from(["morphoflow", "run", "st", "--subject", "a-1", "--subject", "a-2"]).unwrap();
        match cli.command {
            Command::Run { subjects, .. } => assert_eq!(selection(subjects), Selection::only(["a-1", "a-2"])),
            _ => panic!("expected run"),
        }
    }
}
