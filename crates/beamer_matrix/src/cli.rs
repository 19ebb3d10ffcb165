use clap::{Parser, Subcommand};

use crate::config::{ConfigArgs, MatrixConfig};
use crate::doctor::{DoctorArgs, run_doctor};
use crate::error::Result;
use crate::generate::{GenerateArgs, run_generate};
use crate::profile::list_profile_names;
use crate::publish::{MarkupArgs, run_markup};

#[derive(Debug, Parser)]
#[command(
    name = "beamer_matrix",
    about = "Renders every Beamer theme/color theme pair and publishes an HTML matrix",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
#[allow(clippy::large_enum_variant)]
pub enum Commands {
    /// Compile, rasterize and composite every variant, then write the site.
    Generate(GenerateArgs),

    /// Rewrite only the HTML page, stylesheet and assets.
    Markup(MarkupArgs),

    /// Validate tools, templates and profiles.
    Doctor(DoctorArgs),

    /// Print built-in profile names.
    #[command(name = "list-profiles")]
    ListProfiles,

    /// Print the resolved theme and color theme lists.
    #[command(name = "list-themes")]
    ListThemes(ConfigArgs),
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate(args) => run_generate(args),
        Commands::Markup(args) => run_markup(args),
        Commands::Doctor(args) => run_doctor(args),
        Commands::ListProfiles => {
            for name in list_profile_names() {
                println!("{name}");
            }
            Ok(())
        }
        Commands::ListThemes(args) => {
            let cfg = MatrixConfig::resolve(&args)?;
            println!("themes: {}", cfg.themes.join(","));
            println!("color_themes: {}", cfg.color_themes.join(","));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::config::ConfigArgs;
    use crate::error::MatrixError;
    use crate::publish::MarkupArgs;

    use super::{Cli, Commands, run};

    #[test]
    fn list_profiles_command_dispatches_successfully() {
        let result = run(Cli {
            command: Commands::ListProfiles,
        });
        assert!(result.is_ok());
    }

    #[test]
    fn list_themes_dispatches_profile_not_found_error() {
        let result = run(Cli {
            command: Commands::ListThemes(ConfigArgs {
                profile: Some("not-a-real-profile".to_string()),
                ..ConfigArgs::default()
            }),
        });
        match result {
            Err(MatrixError::ProfileNotFound { name }) => assert_eq!(name, "not-a-real-profile"),
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn markup_command_rejects_invalid_theme_names() {
        let result = run(Cli {
            command: Commands::Markup(MarkupArgs {
                config: ConfigArgs {
                    themes: Some("../escape".to_string()),
                    ..ConfigArgs::default()
                },
            }),
        });
        assert!(matches!(result, Err(MatrixError::InvalidArgument { .. })));
    }

    #[test]
    fn generate_flags_parse_into_config_args() {
        let cli = Cli::try_parse_from([
            "beamer_matrix",
            "generate",
            "--themes",
            "Berlin,Warsaw",
            "--color-themes",
            "beaver",
            "--thumb-size",
            "120",
            "--no-optimize",
            "--keep-scratch",
        ])
        .expect("parse");

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.config.themes.as_deref(), Some("Berlin,Warsaw"));
                assert_eq!(args.config.color_themes.as_deref(), Some("beaver"));
                assert_eq!(args.config.thumb_size, Some(120));
                assert!(args.config.no_optimize);
                assert!(args.keep_scratch);
                assert!(!args.keep_documents);
            }
            other => panic!("expected generate, got {other:?}"),
        }
    }
}
