use std::path::PathBuf;

use clap::Parser;
use replay_forge::{
   config::EngineConfig,
   error::BootstrapError,
   manifest,
   orchestrator,
   progress::{ConsoleSink, ProgressEvent, ProgressSink},
   skeleton::HttpSkeletonFetcher,
   types::{Args, Command, ProjectConfig},
   validate,
   vcs,
};

fn main() {
   let args = Args::parse();
   let exit_code = run(args);
   std::process::exit(exit_code);
}

fn run(args: Args) -> i32 {
   if let Some(Command::Init { dir }) = &args.command {
      return match vcs::init(dir) {
         Ok(()) => 0,
         Err(e) => report_error(&e, args.verbose),
      };
   }

   let config = match load_config(&args) {
      Ok(c) => c,
      Err(e) => return report_error(&e, args.verbose),
   };

   let color = !args.no_color && config.color;
   let sink = ConsoleSink { color };

   match run_bootstrap(&args, &config, &sink) {
      Ok(()) => 0,
      Err(e) => {
         if e.requires_rollback() {
            println!("No changes were made.");
         }
         report_error(&e, args.verbose || config.verbose)
      },
   }
}

fn load_config(args: &Args) -> Result<EngineConfig, BootstrapError> {
   match &args.config {
      Some(path) => EngineConfig::from_file(path),
      None => EngineConfig::load(),
   }
}

fn run_bootstrap(args: &Args, config: &EngineConfig, sink: &dyn ProgressSink) -> Result<(), BootstrapError> {
   let manifest_anchor = args.manifest.clone().ok_or_else(|| {
      BootstrapError::Configuration("a manifest file or directory is required".to_string())
   })?;
   let manifests = manifest::discover(&manifest_anchor)?;

   let target_dir = args
      .output
      .clone()
      .unwrap_or_else(|| PathBuf::from(&config.default_target_dir));

   let project = build_project_config(args, &manifests, target_dir)?;

   if args.dry_run {
      let result = validate::validate(&manifests, &project);
      print_validation(&result);
      return if result.is_ok() {
         Ok(())
      } else {
         Err(BootstrapError::Validation(result.errors.len()))
      };
   }

   if !args.yes && !confirm(&project) {
      return Err(BootstrapError::Configuration("aborted by user".to_string()));
   }

   let ledger_path = manifest_anchor.is_dir().then(|| manifest_anchor.join("ledger.txt")).filter(|p| p.exists());
   let ledger_text = ledger_path.as_ref().and_then(|p| std::fs::read_to_string(p).ok());

   let fetcher = HttpSkeletonFetcher { engine_config: config };
   let summary = orchestrator::run(&project, config, manifests, ledger_text.as_deref(), &fetcher, sink)?;

   for warning in &summary.warnings {
      sink.emit(ProgressEvent::Warning { message: warning.clone() });
   }

   Ok(())
}

fn build_project_config(
   args: &Args,
   manifests: &[replay_forge::types::Manifest],
   target_dir: PathBuf,
) -> Result<ProjectConfig, BootstrapError> {
   let old_package = match &args.old_package {
      Some(pkg) => pkg.clone(),
      None => manifests
         .iter()
         .find_map(|m| manifest::infer_base_package(m, manifest::PackageAxis::Source))
         .ok_or_else(|| {
            BootstrapError::Configuration(
               "--old-package was not given and could not be inferred from the manifest set".to_string(),
            )
         })?,
   };

   let new_package = args
      .new_package
      .clone()
      .ok_or_else(|| BootstrapError::Configuration("--new-package is required".to_string()))?;

   let group_id = args
      .group_id
      .clone()
      .ok_or_else(|| BootstrapError::Configuration("--group-id is required".to_string()))?;
   let artifact_id = args
      .artifact_id
      .clone()
      .ok_or_else(|| BootstrapError::Configuration("--artifact-id is required".to_string()))?;

   Ok(ProjectConfig {
      group_id,
      project_name: args.project_name.clone().unwrap_or_else(|| artifact_id.clone()),
      artifact_id,
      version: args.version.clone().unwrap_or_else(|| "0.0.1-SNAPSHOT".to_string()),
      framework_version: args.framework_version.clone().unwrap_or_else(|| "3.3.0".to_string()),
      runtime_version: args.runtime_version.clone().unwrap_or_else(|| "21".to_string()),
      capabilities: args.capability.clone(),
      old_package,
      new_package,
      target_dir,
   })
}

fn confirm(project: &ProjectConfig) -> bool {
   println!(
      "About to materialize '{}' into {} (rewriting {} -> {}). Continue? [y/N]",
      project.artifact_id,
      project.target_dir.display(),
      project.old_package,
      project.new_package
   );
   let mut line = String::new();
   if std::io::stdin().read_line(&mut line).is_err() {
      return false;
   }
   matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_validation(result: &replay_forge::types::ValidationResult) {
   for check in &result.checks {
      let icon = if check.passed { "+" } else { "x" };
      println!("  {icon} {}", check.name);
   }
   for error in &result.errors {
      println!("    -> {}", error.message);
      if let Some(suggestion) = &error.suggestion {
         println!("       suggestion: {suggestion}");
      }
   }
}

fn report_error(error: &BootstrapError, verbose: bool) -> i32 {
   eprintln!("error [{}]: {error}", error.category());
   if verbose {
      eprintln!("  (exit code {})", error.exit_code());
   }
   error.exit_code()
}
