use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Bundle CLAP plugins from a Rust crate")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build a crate and bundle it as a .clap file
    Bundle {
        /// The plugin crate to build
        crate_name: String,

        /// Release mode (default is debug)
        #[arg(long)]
        release: bool,

        /// Copy the bundle into the user's CLAP plugin directory
        #[arg(long)]
        install: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bundle {
            crate_name,
            release,
            install,
        } => bundle_plugin(&crate_name, release, install)?,
    }

    Ok(())
}

/// Builds the plugin's dynamic library and copies it to `target/<profile>/plugins/<crate>.clap`.
fn bundle_plugin(
    crate_name: &str,
    release: bool,
    install: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let project_root = project_root()?;

    println!("Building dynamic library for crate '{crate_name}'...");

    let mut cargo_args = vec!["build", "-p", crate_name];
    if release {
        cargo_args.push("--release");
    }

    let status = Command::new("cargo")
        .args(&cargo_args)
        .current_dir(&project_root)
        .status()?;

    if !status.success() {
        return Err("Failed to build dynamic library".into());
    }

    let profile = if release { "release" } else { "debug" };
    let target_dir = project_root.join("target").join(profile);

    let library_file = target_dir.join(library_file_name(crate_name));
    if !library_file.exists() {
        return Err(format!("Dynamic library not found: {}", library_file.display()).into());
    }

    let plugin_output_dir = target_dir.join("plugins");
    std::fs::create_dir_all(&plugin_output_dir)?;

    let bundle_file = plugin_output_dir.join(format!("{crate_name}.clap"));
    std::fs::copy(&library_file, &bundle_file)?;
    println!("Bundled plugin: {}", bundle_file.display());

    if install {
        let install_dir = clap_install_dir()
            .ok_or("Could not determine the CLAP plugin directory for this platform")?;
        std::fs::create_dir_all(&install_dir)?;

        let installed_file = install_dir.join(format!("{crate_name}.clap"));
        std::fs::copy(&bundle_file, &installed_file)?;
        println!("Installed plugin: {}", installed_file.display());
    }

    Ok(())
}

/// The file name cargo gives a cdylib on this platform.
fn library_file_name(crate_name: &str) -> String {
    let normalized_crate_name = crate_name.replace('-', "_");

    if cfg!(windows) {
        format!("{normalized_crate_name}.dll")
    } else if cfg!(target_os = "macos") {
        format!("lib{normalized_crate_name}.dylib")
    } else {
        format!("lib{normalized_crate_name}.so")
    }
}

/// The per-user CLAP directory hosts scan on this platform.
fn clap_install_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        std::env::var_os("COMMONPROGRAMFILES").map(|dir| PathBuf::from(dir).join("CLAP"))
    } else if cfg!(target_os = "macos") {
        dirs::home_dir().map(|home| home.join("Library/Audio/Plug-Ins/CLAP"))
    } else {
        dirs::home_dir().map(|home| home.join(".clap"))
    }
}

/// Get the project root directory
fn project_root() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(1)
        .map(Path::to_path_buf)
        .ok_or_else(|| "xtask is not inside a workspace".into())
}
