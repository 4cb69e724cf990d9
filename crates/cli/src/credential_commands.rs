use {
    anyhow::{Context, Result},
    clap::{Args, Subcommand},
    secrecy::Secret,
    tokenrelay_oauth::{
        CredentialRecord, CredentialStore, RefreshTokenLocation, load_credential_config, validate,
    },
};

#[derive(Subcommand)]
pub enum CredentialAction {
    /// Add or replace a stored credential.
    Add(AddArgs),
    /// Change fields of a stored credential.
    Set(SetArgs),
    /// List stored credentials.
    List,
    /// Show a stored credential (tokens redacted unless --reveal).
    Show {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = false)]
        reveal: bool,
    },
    /// Remove a stored credential.
    Remove {
        #[arg(long)]
        name: String,
    },
    /// Copy credentials declared in the config file into the store.
    Import {
        /// Only import this credential.
        #[arg(long)]
        name: Option<String>,
        /// Replace credentials that are already stored.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Args)]
pub struct AddArgs {
    /// Credential name (e.g. "crm").
    #[arg(long)]
    name: String,
    #[arg(long, env = "TOKENRELAY_REFRESH_TOKEN", hide_env_values = true)]
    refresh_token: String,
    #[arg(long)]
    refresh_url: String,
    #[arg(long)]
    test_url: String,
    #[arg(long, env = "TOKENRELAY_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
    #[arg(long)]
    access_token_field: Option<String>,
    #[arg(long)]
    refresh_token_field: Option<String>,
    #[arg(long)]
    auth_header_prefix: Option<String>,
    /// Send the refresh token as a `header` or in the JSON `body`.
    #[arg(long, default_value = "header")]
    location: RefreshTokenLocation,
}

#[derive(Args)]
pub struct SetArgs {
    #[arg(long)]
    name: String,
    #[arg(long, env = "TOKENRELAY_REFRESH_TOKEN", hide_env_values = true)]
    refresh_token: Option<String>,
    #[arg(long)]
    refresh_url: Option<String>,
    #[arg(long)]
    test_url: Option<String>,
    #[arg(long, env = "TOKENRELAY_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
    #[arg(long)]
    access_token_field: Option<String>,
    #[arg(long)]
    refresh_token_field: Option<String>,
    #[arg(long)]
    auth_header_prefix: Option<String>,
    #[arg(long)]
    location: Option<RefreshTokenLocation>,
}

pub fn handle_credential(action: CredentialAction) -> Result<()> {
    let store = CredentialStore::new();
    match action {
        CredentialAction::Add(args) => add(&store, args),
        CredentialAction::Set(args) => set(&store, args),
        CredentialAction::List => list(&store),
        CredentialAction::Show { name, reveal } => show(&store, &name, reveal),
        CredentialAction::Remove { name } => remove(&store, &name),
        CredentialAction::Import { name, force } => import(&store, name.as_deref(), force),
    }
}

fn build_record(args: AddArgs) -> Result<(String, CredentialRecord)> {
    let mut record = CredentialRecord::new(args.refresh_token, args.refresh_url, args.test_url)
        .with_location(args.location);
    if let Some(token) = args.access_token {
        record.access_token = Secret::new(token);
    }
    if let Some(field) = args.access_token_field {
        record.access_token_field_name = field;
    }
    if let Some(field) = args.refresh_token_field {
        record.refresh_token_field_name = field;
    }
    if let Some(prefix) = args.auth_header_prefix {
        record.auth_header_prefix = prefix;
    }
    validate(&record).with_context(|| format!("invalid credential {}", args.name))?;
    Ok((args.name, record))
}

fn add(store: &CredentialStore, args: AddArgs) -> Result<()> {
    let (name, record) = build_record(args)?;
    store.save(&name, &record)?;
    println!("Saved credential {name} to {}", store.path().display());
    Ok(())
}

/// Overwrite the given fields of `record`; unset arguments leave fields alone.
fn apply_set(record: &mut CredentialRecord, args: SetArgs) {
    if let Some(token) = args.refresh_token {
        record.refresh_token = Secret::new(token);
    }
    if let Some(url) = args.refresh_url {
        record.refresh_url = url;
    }
    if let Some(url) = args.test_url {
        record.test_url = url;
    }
    if let Some(token) = args.access_token {
        record.access_token = Secret::new(token);
    }
    if let Some(field) = args.access_token_field {
        record.access_token_field_name = field;
    }
    if let Some(field) = args.refresh_token_field {
        record.refresh_token_field_name = field;
    }
    if let Some(prefix) = args.auth_header_prefix {
        record.auth_header_prefix = prefix;
    }
    if let Some(location) = args.location {
        record.refresh_token_location = location;
    }
}

fn set(store: &CredentialStore, args: SetArgs) -> Result<()> {
    let name = args.name.clone();
    let mut record = store
        .load(&name)?
        .ok_or_else(|| anyhow::anyhow!("unknown credential: {name}"))?;
    apply_set(&mut record, args);
    validate(&record).with_context(|| format!("invalid credential {name}"))?;
    store.save(&name, &record)?;
    println!("Updated credential {name}");
    Ok(())
}

fn list(store: &CredentialStore) -> Result<()> {
    let names = store.list()?;
    if names.is_empty() {
        println!("No stored credentials.");
        return Ok(());
    }
    for name in names {
        if let Some(record) = store.load(&name)? {
            println!(
                "{name} [{} via {}]",
                record.refresh_url, record.refresh_token_location
            );
        }
    }
    Ok(())
}

/// The stored JSON form of a record, with token values masked unless `reveal`.
fn display_value(record: &CredentialRecord, reveal: bool) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(record)?;
    if !reveal && let Some(obj) = value.as_object_mut() {
        for key in ["accessToken", "refreshToken"] {
            obj.insert(key.into(), "[REDACTED]".into());
        }
    }
    Ok(value)
}

fn show(store: &CredentialStore, name: &str, reveal: bool) -> Result<()> {
    let record = store
        .load(name)?
        .ok_or_else(|| anyhow::anyhow!("unknown credential: {name}"))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&display_value(&record, reveal)?)?
    );
    Ok(())
}

fn remove(store: &CredentialStore, name: &str) -> Result<()> {
    if store.delete(name)? {
        println!("Removed credential {name}");
    } else {
        println!("No stored credential named {name}");
    }
    Ok(())
}

fn import(store: &CredentialStore, only: Option<&str>, force: bool) -> Result<()> {
    let config = tokenrelay_config::discover_and_load();
    let names: Vec<String> = match only {
        Some(name) => vec![name.to_string()],
        None => config.credentials.keys().cloned().collect(),
    };
    if names.is_empty() {
        println!("No credentials declared in the config file.");
        return Ok(());
    }

    for name in names {
        let record = load_credential_config(&name)?
            .ok_or_else(|| anyhow::anyhow!("credential {name} is not declared in the config file"))?;
        validate(&record).with_context(|| format!("invalid credential {name}"))?;

        if !force && store.load(&name)?.is_some() {
            println!("Skipped {name} (already stored, use --force to replace)");
            continue;
        }
        store.save(&name, &record)?;
        println!("Imported {name}");
    }
    Ok(())
}
