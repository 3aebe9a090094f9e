//! Command-line interface for building and checking `.pkpass` files.
//!
//! `pkpass sign` packs a pass directory and signs it with a Pass Type ID
//! certificate; `pkpass inspect` lists a container and verifies it.

use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;
use pkpass::{CompressionLevel, Image, PassGenerator, PassReader, SigningCredentials};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "pkpass")]
#[command(about = "Build, sign and inspect Apple Wallet passes")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pack and sign a pass
    Sign(SignArgs),
    /// List a pass's contents and verify its signature
    Inspect {
        /// The .pkpass file
        input: PathBuf,
    },
}

#[derive(Args)]
struct SignArgs {
    /// pass.json (default: <assets>/pass.json)
    #[arg(long)]
    pass: Option<PathBuf>,

    /// Directory with images and <code>.lproj/ localizations
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Pass Type ID certificate (PEM or DER)
    #[arg(short = 'c', long)]
    certificate: Option<PathBuf>,

    /// Private key for the certificate (PEM or DER)
    #[arg(short = 'k', long)]
    key: Option<PathBuf>,

    /// PKCS#12 file (.p12) holding certificate and key
    #[arg(short = 'p', long)]
    pkcs12: Option<PathBuf>,

    /// Password for the PKCS#12 file
    #[arg(long)]
    password: Option<String>,

    /// Apple WWDR intermediate certificate (PEM or DER)
    #[arg(short = 'i', long)]
    intermediate: PathBuf,

    /// Output file (default: pass.pkpass)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// ZIP compression level (0-9, default: 6)
    #[arg(short = 'z', long, default_value = "6")]
    zip_level: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Sign(args) => sign(&args),
        Command::Inspect { input } => inspect(&input),
    }
}

fn sign(args: &SignArgs) -> Result<(), Box<dyn std::error::Error>> {
    let credentials = load_credentials(args)?;

    let pass_path = match (&args.pass, &args.assets) {
        (Some(path), _) => path.clone(),
        (None, Some(dir)) => dir.join(pkpass::PASS_FILE),
        (None, None) => return Err("Must provide --pass or --assets".into()),
    };

    let mut generator =
        PassGenerator::new().compression_level(CompressionLevel::new(args.zip_level));
    generator.add_pass_data(&std::fs::read(&pass_path)?)?;

    if let Some(dir) = &args.assets {
        add_assets(&mut generator, dir)?;
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from("pass.pkpass"));
    let bytes = generator.sign(&credentials)?;
    std::fs::write(&output, &bytes)?;

    println!("Signed: {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}

fn load_credentials(args: &SignArgs) -> Result<SigningCredentials, Box<dyn std::error::Error>> {
    let intermediate = std::fs::read(&args.intermediate)?;

    if let Some(ref p12_path) = args.pkcs12 {
        let p12_data = std::fs::read(p12_path)?;
        let password = args.password.as_deref().unwrap_or("");
        let creds = SigningCredentials::from_p12(&p12_data, password, Some(&intermediate))?;
        return Ok(creds);
    }

    if let (Some(ref cert_path), Some(ref key_path)) = (&args.certificate, &args.key) {
        let cert_data = std::fs::read(cert_path)?;
        let key_data = std::fs::read(key_path)?;
        let creds = SigningCredentials::from_bytes(&cert_data, &intermediate, &key_data)?;
        return Ok(creds);
    }

    Err("Must provide either --pkcs12 or both --certificate and --key".into())
}

/// Adds root images, extra root files and `<code>.lproj/` contents.
fn add_assets(generator: &mut PassGenerator, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(2)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir)?;
        let parts: Vec<&str> = relative
            .iter()
            .map(|part| part.to_str().ok_or("non-UTF-8 file name"))
            .collect::<Result<_, _>>()?;

        match parts.as_slice() {
            [name] if name.starts_with('.') => continue,
            [name] if *name == pkpass::PASS_FILE => continue,
            [name] if *name == pkpass::MANIFEST_FILE || *name == pkpass::SIGNATURE_FILE => {
                log::warn!("skipping stale {name}");
                continue;
            }
            [name] if *name == pkpass::PERSONALIZATION_FILE => {
                generator.add_personalization_data(&std::fs::read(entry.path())?)?;
            }
            [name] => {
                let data = std::fs::read(entry.path())?;
                match Image::from_filename(name) {
                    Some(image) => generator.add_image(image, None, &data)?,
                    None => generator.add_file(name, &data)?,
                }
            }
            [directory, name] => {
                let Some(code) = directory.strip_suffix(".lproj") else {
                    log::warn!("skipping {}", relative.display());
                    continue;
                };
                if name.starts_with('.') {
                    continue;
                }
                let data = std::fs::read(entry.path())?;
                if *name == pkpass::localization::STRINGS_FILE {
                    generator.add_strings(code, &data)?;
                } else if let Some(image) = Image::from_filename(name) {
                    generator.add_image(image, Some(code), &data)?;
                } else {
                    log::warn!("skipping {}", relative.display());
                    continue;
                }
            }
            _ => continue,
        }
        log::info!("added {}", relative.display());
    }
    Ok(())
}

fn inspect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let reader = PassReader::open_file(input)?;

    println!("Entries:");
    for entry in reader.archive().entries() {
        println!(
            "  {:<32} {:>8} bytes ({:?})",
            entry.path, entry.size, entry.compression
        );
    }

    let locales = reader.localizations();
    if !locales.is_empty() {
        let codes: Vec<_> = locales.into_iter().collect();
        println!("Localizations: {}", codes.join(", "));
    }

    let pass = reader.pass()?;
    println!(
        "Pass: {} ({}, {}, serial {})",
        pass.description,
        pass.style().map_or("no style", |s| s.key()),
        pass.pass_type_identifier,
        pass.serial_number
    );
    if let Err(e) = pass.validate() {
        println!("Warning: {e}");
    }

    let info = reader.verify()?;
    let signer = info
        .signer_certificate()
        .and_then(|c| c.common_name())
        .unwrap_or_else(|| "unknown signer".to_string());
    match info.signing_time {
        Some(time) => println!("Verified: signed by {signer} at {}", time.components()),
        None => println!("Verified: signed by {signer}"),
    }
    Ok(())
}
