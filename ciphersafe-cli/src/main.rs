#![deny(missing_docs)]
//! A command-line interface for CipherSafe.

use ciphersafe_core::CipherError;
use ciphersafe_core::alphabet::NormalizedText;
use ciphersafe_core::cipher::{Cipher, CipherKind};
use ciphersafe_core::key_generator::{DEFAULT_KEYWORD_LENGTH, KeyMaterialGenerator};
use ciphersafe_core::message_log::{self, MessageEntry, MessageLog, MessageStatus, OperationRecord};
use ciphersafe_core::stego::{self, SteganographyCodec, TERMINATOR};
use ciphersafe_core::vault::{self, VaultState};
use ciphersafe_core::vernam::OneTimePadCipher;
use ciphersafe_core::vigenere::SubstitutionCipher;
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::DynamicImage;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(
    after_help = "EXAMPLES:\n  \n# Initialize a new vault\nciphersafe --vault ./zoe vault init\n\n# Encrypt with a shared keyword\nciphersafe --vault ./zoe encrypt vigenere --message \"Meet at noon\" --keyword GHOST\n\n# Encrypt with a fresh one-time pad\nciphersafe --vault ./zoe encrypt vernam --message \"Infiltrate at midnight\"\n\n# Decrypt a one-time-pad message in the receiver's vault\nciphersafe --vault ./misato decrypt vernam --ciphertext <CIPHERTEXT> --key <KEY>\n\n# Hide ciphertext in an image\nciphersafe stego embed --carrier cover.png --output secret.png --text <CIPHERTEXT>"
)]
struct Cli {
    /// The path to the CipherSafe vault.
    #[arg(long, global = true, env = "CIPHERSAFE_VAULT")]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage vaults
    Vault {
        #[command(subcommand)]
        command: VaultCommands,
    },
    /// Manage shared Vigenère keywords
    Keyword {
        #[command(subcommand)]
        command: KeywordCommands,
    },
    /// Encrypt a message and record it in the message log
    Encrypt {
        #[command(subcommand)]
        command: EncryptCommands,
    },
    /// Decrypt a message
    Decrypt {
        #[command(subcommand)]
        command: DecryptCommands,
    },
    /// Inspect the message log
    Log {
        #[command(subcommand)]
        command: LogCommands,
    },
    /// Hide text in images or recover it
    Stego {
        #[command(subcommand)]
        command: StegoCommands,
    },
}

#[derive(Subcommand)]
enum VaultCommands {
    /// Initialize a new vault at the specified path
    Init,
    /// Show the status of the vault
    Status,
}

#[derive(Subcommand)]
enum KeywordCommands {
    /// Generate a random keyword
    Generate {
        /// Number of letters in the keyword
        #[arg(short, long, default_value_t = DEFAULT_KEYWORD_LENGTH)]
        length: usize,
        /// Save the keyword in the vault under this id
        #[arg(long, value_name = "ID")]
        save: Option<String>,
    },
    /// Save a keyword agreed with another agent
    Save {
        /// Id to look the keyword up by
        #[arg(long)]
        id: String,
        /// The keyword itself
        #[arg(long)]
        value: String,
    },
    /// List saved keywords
    List,
}

#[derive(Args)]
struct Parties {
    /// Sending agent
    #[arg(long, default_value = "ZOE")]
    sender: String,
    /// Receiving agent
    #[arg(long, default_value = "MISATO")]
    receiver: String,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct KeywordSource {
    /// The Vigenère keyword
    #[arg(long)]
    keyword: Option<String>,
    /// Id of a keyword saved in the vault
    #[arg(long, value_name = "ID")]
    keyword_id: Option<String>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct CiphertextSource {
    /// Ciphertext to decrypt
    #[arg(long)]
    ciphertext: Option<String>,
    /// Id of a logged message to decrypt
    #[arg(long, value_name = "MESSAGE_ID")]
    message_id: Option<Uuid>,
}

#[derive(Args)]
struct EmbedTarget {
    /// Also hide the ciphertext in this carrier image
    #[arg(long, requires = "stego_output")]
    carrier: Option<PathBuf>,
    /// Where to write the image carrying the ciphertext
    #[arg(long, requires = "carrier", value_name = "OUTPUT_IMAGE")]
    stego_output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum EncryptCommands {
    /// Encrypt with a repeating keyword
    Vigenere {
        /// Message to encrypt
        #[arg(short, long)]
        message: String,
        #[command(flatten)]
        keyword: KeywordSource,
        #[command(flatten)]
        parties: Parties,
        #[command(flatten)]
        embed: EmbedTarget,
    },
    /// Encrypt with a one-time pad. A fresh key is issued unless --key is given.
    Vernam {
        /// Message to encrypt
        #[arg(short, long)]
        message: String,
        /// A key at least as long as the message. It must never have been used.
        #[arg(long)]
        key: Option<String>,
        #[command(flatten)]
        parties: Parties,
        #[command(flatten)]
        embed: EmbedTarget,
    },
}

#[derive(Subcommand)]
enum DecryptCommands {
    /// Decrypt with a repeating keyword
    Vigenere {
        #[command(flatten)]
        source: CiphertextSource,
        #[command(flatten)]
        keyword: KeywordSource,
    },
    /// Decrypt with a one-time pad. The key is retired afterwards.
    Vernam {
        #[command(flatten)]
        source: CiphertextSource,
        /// The one-time-pad key
        #[arg(long)]
        key: String,
    },
}

#[derive(Subcommand)]
enum LogCommands {
    /// List logged messages
    List {
        /// Only show messages that have not been decrypted
        #[arg(long)]
        encrypted_only: bool,
    },
    /// Show one message as JSON
    Show {
        /// Id of the message
        #[arg(long)]
        id: Uuid,
    },
    /// Record a ciphertext received from another agent, to decrypt later by id
    Receive {
        /// The ciphertext as received
        #[arg(long)]
        ciphertext: String,
        /// Cipher the sender used
        #[arg(long, value_enum)]
        cipher: CipherArg,
        #[command(flatten)]
        parties: Parties,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CipherArg {
    /// Repeating-keyword substitution
    Vigenere,
    /// One-time pad
    Vernam,
}

impl From<CipherArg> for CipherKind {
    fn from(arg: CipherArg) -> Self {
        match arg {
            CipherArg::Vigenere => Self::Vigenere,
            CipherArg::Vernam => Self::Vernam,
        }
    }
}

#[derive(Subcommand)]
enum StegoCommands {
    /// Show how many characters an image can hide
    Capacity {
        /// The carrier image
        #[arg(long)]
        image: PathBuf,
    },
    /// Hide text in a carrier image
    Embed {
        /// The carrier image
        #[arg(long)]
        carrier: PathBuf,
        /// Where to write the resulting PNG
        #[arg(short, long)]
        output: PathBuf,
        /// Text to hide
        #[arg(long, conflicts_with = "message_id", required_unless_present = "message_id")]
        text: Option<String>,
        /// Hide the ciphertext of this logged message
        #[arg(long, value_name = "MESSAGE_ID")]
        message_id: Option<Uuid>,
    },
    /// Recover text hidden in an image
    Extract {
        /// The image to read
        #[arg(long)]
        image: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CipherError> {
    let vault_dir = cli.vault.as_deref();
    match cli.command {
        Commands::Vault { command } => match command {
            VaultCommands::Init => {
                let path = vault_dir.ok_or_else(|| missing_vault("vault init"))?;
                info!("Initializing new vault at '{}'", path.display());
                vault::init_vault(path)?;
                println!("Vault initialized at '{}'", path.display());
                Ok(())
            }
            VaultCommands::Status => vault_status(require_vault(vault_dir)?),
        },
        Commands::Keyword { command } => keyword_command(require_vault(vault_dir)?, command),
        Commands::Encrypt { command } => encrypt_command(require_vault(vault_dir)?, command),
        Commands::Decrypt { command } => decrypt_command(require_vault(vault_dir)?, command),
        Commands::Log { command } => log_command(require_vault(vault_dir)?, command),
        Commands::Stego { command } => stego_command(vault_dir, command),
    }
}

fn missing_vault(command: &str) -> CipherError {
    CipherError::Validation(format!("The --vault path is required for '{command}'"))
}

fn require_vault(vault_dir: Option<&Path>) -> Result<&Path, CipherError> {
    let path = vault_dir.ok_or_else(|| missing_vault("this command"))?;
    if !path.exists() {
        return Err(CipherError::NotFound(format!(
            "vault path '{}' does not exist. Please create it with 'vault init'.",
            path.display()
        )));
    }
    Ok(path)
}

fn open_log(vault_path: &Path) -> Result<MessageLog, CipherError> {
    MessageLog::open(&vault_path.join(message_log::LOG_FILE))
}

fn vault_status(vault_path: &Path) -> Result<(), CipherError> {
    let state = vault::load_state(vault_path)?;
    let log = open_log(vault_path)?;
    let registry = state.registry();

    let total_messages = log.list_all().len();
    let encrypted = log.list_encrypted_only().len();

    println!("Vault Status for: {}", vault_path.display());
    println!("{:-<40}", "");
    println!("Messages: {total_messages}");
    println!("  - Encrypted: {encrypted}");
    println!("  - Decrypted: {}", total_messages - encrypted);
    println!();
    println!("OTP Keys: {}", registry.len());
    println!("  - Used: {}", registry.used_count());
    println!("  - Unused: {}", registry.len() - registry.used_count());
    println!();
    println!("Shared Keywords: {}", state.keywords.len());
    Ok(())
}

fn keyword_command(vault_path: &Path, command: KeywordCommands) -> Result<(), CipherError> {
    let _lock = vault::lock_vault(vault_path)?;
    let mut state = vault::load_state(vault_path)?;
    match command {
        KeywordCommands::Generate { length, save } => {
            let keyword = KeyMaterialGenerator::new().generate_keyword(length)?;
            if let Some(id) = save {
                state.add_keyword(&id, keyword.as_str())?;
                vault::save_state(vault_path, &state)?;
                info!("Saved generated keyword as '{id}'.");
            }
            println!("{keyword}");
        }
        KeywordCommands::Save { id, value } => {
            state.add_keyword(&id, &value)?;
            vault::save_state(vault_path, &state)?;
            println!("Saved keyword '{id}'.");
        }
        KeywordCommands::List => {
            if state.keywords.is_empty() {
                println!("No keywords found in vault '{}'", vault_path.display());
                return Ok(());
            }
            println!("{:<24} {:<20}", "ID", "Keyword");
            println!("{:-<45}", "");
            for (id, keyword) in &state.keywords {
                println!("{id:<24} {:<20}", keyword.value);
            }
        }
    }
    Ok(())
}

fn resolve_keyword(state: &VaultState, source: KeywordSource) -> Result<String, CipherError> {
    match (source.keyword, source.keyword_id) {
        (Some(keyword), _) => Ok(keyword),
        (None, Some(id)) => state
            .keyword(&id)
            .map(|k| k.value.as_str().to_string())
            .ok_or_else(|| CipherError::NotFound(format!("keyword '{id}'"))),
        (None, None) => Err(CipherError::Validation(
            "a --keyword or --keyword-id is required".to_string(),
        )),
    }
}

/// A carrier loaded before any vault state changes, so a bad image fails early.
struct Embedding {
    carrier: DynamicImage,
    output: PathBuf,
}

impl Embedding {
    fn open(target: EmbedTarget) -> Result<Option<Self>, CipherError> {
        let (Some(carrier), Some(output)) = (target.carrier, target.stego_output) else {
            return Ok(None);
        };
        Ok(Some(Self {
            carrier: stego::open_carrier(&carrier)?,
            output,
        }))
    }

    fn hide(&self, ciphertext: &NormalizedText) -> Result<DynamicImage, CipherError> {
        SteganographyCodec::new().encode(&self.carrier, ciphertext.as_str())
    }

    fn write(&self, stego_image: &DynamicImage) -> Result<(), CipherError> {
        stego::save_stego(stego_image, &self.output)?;
        println!("Ciphertext hidden in '{}'", self.output.display());
        Ok(())
    }
}

/// Hides `ciphertext` if an embedding was requested.
fn hide_in(
    embedding: Option<&Embedding>,
    ciphertext: &NormalizedText,
) -> Result<Option<DynamicImage>, CipherError> {
    embedding.map(|e| e.hide(ciphertext)).transpose()
}

/// Writes the stego image prepared by [`hide_in`], if any.
fn write_hidden(embedding: Option<&Embedding>, stego_image: Option<&DynamicImage>) -> Result<(), CipherError> {
    if let (Some(embedding), Some(stego_image)) = (embedding, stego_image) {
        embedding.write(stego_image)?;
    }
    Ok(())
}

fn encrypt_command(vault_path: &Path, command: EncryptCommands) -> Result<(), CipherError> {
    let _lock = vault::lock_vault(vault_path)?;
    let mut state = vault::load_state(vault_path)?;
    let mut log = open_log(vault_path)?;
    // Nothing is persisted until the ciphertext and any stego image are ready.
    match command {
        EncryptCommands::Vigenere {
            message,
            keyword,
            parties,
            embed,
        } => {
            let embedding = Embedding::open(embed)?;
            let keyword = resolve_keyword(&state, keyword)?;
            let cipher = SubstitutionCipher::new();
            let ciphertext = cipher.encrypt(&message, &keyword)?;
            let stego_image = hide_in(embedding.as_ref(), &ciphertext)?;
            write_hidden(embedding.as_ref(), stego_image.as_ref())?;

            let id = log.append(OperationRecord {
                sender: parties.sender,
                receiver: parties.receiver,
                cipher_kind: cipher.kind(),
                ciphertext: ciphertext.clone(),
                plaintext: Some(NormalizedText::new(&message)),
                key: Some(NormalizedText::new(&keyword)),
            })?;
            println!("Ciphertext: {ciphertext}");
            println!("Message ID: {id}");
        }
        EncryptCommands::Vernam {
            message,
            key,
            parties,
            embed,
        } => {
            let plaintext = NormalizedText::new(&message);
            if plaintext.is_empty() {
                return Err(CipherError::Validation(
                    "plaintext must contain at least one letter".to_string(),
                ));
            }
            let embedding = Embedding::open(embed)?;
            let registry = state.registry();
            let key = match key {
                Some(raw) => NormalizedText::new(&raw),
                None => registry.issue(plaintext.len())?,
            };
            let cipher = OneTimePadCipher::new();
            let (ciphertext, stego_image) = registry.consume_with(key.as_str(), |k| {
                let ciphertext = cipher.encrypt(plaintext.as_str(), k.as_str())?;
                let stego_image = hide_in(embedding.as_ref(), &ciphertext)?;
                Ok((ciphertext, stego_image))
            })?;
            write_hidden(embedding.as_ref(), stego_image.as_ref())?;
            state.store_registry(&registry);
            vault::save_state(vault_path, &state)?;

            let id = log.append(OperationRecord {
                sender: parties.sender,
                receiver: parties.receiver,
                cipher_kind: cipher.kind(),
                ciphertext: ciphertext.clone(),
                plaintext: Some(plaintext),
                key: Some(key.clone()),
            })?;
            println!("Ciphertext: {ciphertext}");
            println!("OTP Key: {key}");
            println!("Message ID: {id}");
        }
    }
    Ok(())
}

/// The ciphertext to decrypt, and the log entry it came from if any.
fn resolve_ciphertext(
    log: &MessageLog,
    source: CiphertextSource,
    expected: CipherKind,
) -> Result<(String, Option<Uuid>), CipherError> {
    let Some(id) = source.message_id else {
        return source
            .ciphertext
            .map(|c| (c, None))
            .ok_or_else(|| CipherError::Validation("a --ciphertext or --message-id is required".to_string()));
    };
    let entry = find_entry(log, id)?;
    if entry.cipher_kind != expected {
        return Err(CipherError::Validation(format!(
            "message {id} was encrypted with {}, not {expected}",
            entry.cipher_kind
        )));
    }
    // A pad is spent once the plaintext is known; decrypting again could only fail on reuse.
    if expected == CipherKind::Vernam && entry.status == MessageStatus::Decrypted {
        return Err(CipherError::Validation(format!(
            "message {id} is already decrypted and its OTP key is spent. Use 'log show --id {id}' to read it."
        )));
    }
    if !entry.ciphertext_intact() {
        return Err(CipherError::Validation(format!(
            "ciphertext of message {id} does not match its recorded hash. The log may be corrupt or tampered with."
        )));
    }
    Ok((entry.ciphertext.as_str().to_string(), Some(id)))
}

fn find_entry(log: &MessageLog, id: Uuid) -> Result<&MessageEntry, CipherError> {
    log.get(id)
        .ok_or_else(|| CipherError::NotFound(format!("message {id}")))
}

fn decrypt_command(vault_path: &Path, command: DecryptCommands) -> Result<(), CipherError> {
    let _lock = vault::lock_vault(vault_path)?;
    let mut state = vault::load_state(vault_path)?;
    let mut log = open_log(vault_path)?;
    let (plaintext, message_id) = match command {
        DecryptCommands::Vigenere { source, keyword } => {
            let cipher = SubstitutionCipher::new();
            let (ciphertext, message_id) = resolve_ciphertext(&log, source, cipher.kind())?;
            let keyword = resolve_keyword(&state, keyword)?;
            (cipher.decrypt(&ciphertext, &keyword)?, message_id)
        }
        DecryptCommands::Vernam { source, key } => {
            let cipher = OneTimePadCipher::new();
            let (ciphertext, message_id) = resolve_ciphertext(&log, source, cipher.kind())?;
            let registry = state.registry();
            let plaintext = registry.consume_with(&key, |k| cipher.decrypt(&ciphertext, k.as_str()))?;
            state.store_registry(&registry);
            vault::save_state(vault_path, &state)?;
            (plaintext, message_id)
        }
    };

    if let Some(id) = message_id {
        log.record_decryption(id, plaintext.clone())?;
        info!("Recorded plaintext for message {id}.");
    }
    println!("Plaintext: {plaintext}");
    Ok(())
}

fn log_command(vault_path: &Path, command: LogCommands) -> Result<(), CipherError> {
    let _lock = vault::lock_vault(vault_path)?;
    let mut log = open_log(vault_path)?;
    match command {
        LogCommands::List { encrypted_only } => {
            let entries: Vec<&MessageEntry> = if encrypted_only {
                log.list_encrypted_only()
            } else {
                log.list_all().iter().collect()
            };
            if entries.is_empty() {
                println!("No messages recorded yet.");
                return Ok(());
            }
            for entry in entries {
                println!("{:-<60}", "");
                println!(
                    "{} | {} | {} -> {}",
                    entry.id, entry.cipher_kind, entry.sender, entry.receiver
                );
                println!("Encrypted: {}", entry.ciphertext);
                if let Some(plaintext) = &entry.plaintext {
                    println!("Decrypted: {plaintext}");
                }
            }
        }
        LogCommands::Show { id } => {
            let entry = find_entry(&log, id)?;
            println!("{}", serde_json::to_string_pretty(entry)?);
        }
        LogCommands::Receive {
            ciphertext,
            cipher,
            parties,
        } => {
            let ciphertext = NormalizedText::new(&ciphertext);
            if ciphertext.is_empty() {
                return Err(CipherError::Validation(
                    "ciphertext must contain at least one letter".to_string(),
                ));
            }
            let id = log.append(OperationRecord {
                sender: parties.sender,
                receiver: parties.receiver,
                cipher_kind: cipher.into(),
                ciphertext,
                plaintext: None,
                key: None,
            })?;
            println!("Message ID: {id}");
        }
    }
    Ok(())
}

fn stego_command(vault_dir: Option<&Path>, command: StegoCommands) -> Result<(), CipherError> {
    let codec = SteganographyCodec::new();
    match command {
        StegoCommands::Capacity { image } => {
            let carrier = stego::open_carrier(&image)?;
            let capacity = codec.capacity(&carrier);
            println!(
                "Capacity: {capacity} characters ({} usable after the terminator)",
                capacity.saturating_sub(TERMINATOR.len())
            );
        }
        StegoCommands::Embed {
            carrier,
            output,
            text,
            message_id,
        } => {
            let secret = match (text, message_id) {
                (Some(text), _) => text,
                (None, Some(id)) => {
                    let log = open_log(require_vault(vault_dir)?)?;
                    find_entry(&log, id)?.ciphertext.as_str().to_string()
                }
                (None, None) => {
                    return Err(CipherError::Validation(
                        "a --text or --message-id is required".to_string(),
                    ));
                }
            };
            let image = stego::open_carrier(&carrier)?;
            let stego_image = codec.encode(&image, &secret)?;
            stego::save_stego(&stego_image, &output)?;
            println!(
                "Hidden {} characters in '{}'",
                secret.len(),
                output.display()
            );
        }
        StegoCommands::Extract { image } => {
            let stego_image = stego::open_carrier(&image)?;
            match codec.decode(&stego_image)? {
                Some(secret) => println!("Hidden message: {secret}"),
                None => {
                    warn!("'{}' carries no terminator.", image.display());
                    println!("No hidden message found.");
                }
            }
        }
    }
    Ok(())
}
