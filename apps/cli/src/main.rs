use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    ContactForm, ContactStore, DraftField, NoticeSeverity, StoreEvent, SubmitOutcome,
};
use shared::domain::{Contact, ContactId};
use tokio::sync::broadcast;
use url::Url;

mod config;

const FALLBACK_AVATAR_URL: &str = "https://placehold.co/96x96/d1d5db/4b5563?text=User";

#[derive(Parser, Debug)]
#[command(name = "contacts", about = "Contact book backed by a remote REST API")]
struct Args {
    /// API base URL; overrides contacts.toml and CONTACTS_API_URL.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print the contact list.
    List,
    /// Create a new contact.
    Add {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// Street line; optional.
        #[arg(long, default_value = "")]
        address: String,
    },
    /// Edit an existing contact; omitted fields keep their current values.
    Edit {
        id: i64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Delete a contact.
    Delete {
        id: i64,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let settings = config::load_settings();
    let api_url = args.api_url.unwrap_or(settings.api_url);
    Url::parse(&api_url).with_context(|| format!("invalid API base URL: {api_url}"))?;
    tracing::debug!(api_url = %api_url, "contact api endpoint selected");

    let store = ContactStore::new(api_url);
    let mut events = store.subscribe();

    // Initial load; the session always starts from the server's view.
    store.fetch_all().await;
    print_notices(&mut events);

    match args.command {
        Command::List => {
            let snapshot = store.snapshot().await;
            if let Some(error) = snapshot.error {
                bail!(error);
            }
            if snapshot.contacts.is_empty() {
                println!("No contacts found. Use `contacts add` to get started!");
            }
            for contact in &snapshot.contacts {
                print_contact(contact);
            }
        }
        Command::Add {
            first_name,
            last_name,
            email,
            phone,
            address,
        } => {
            let mut form = ContactForm::create();
            form.set_field(DraftField::FirstName, first_name);
            form.set_field(DraftField::LastName, last_name);
            form.set_field(DraftField::Email, email);
            form.set_field(DraftField::Phone, phone);
            form.set_field(DraftField::Address, address);
            finish_submit(form.submit(&store).await, &mut events)?;
        }
        Command::Edit {
            id,
            first_name,
            last_name,
            email,
            phone,
            address,
        } => {
            let mut form = ContactForm::edit(ContactId(id));
            form.sync_from_store(&store).await;
            let overrides = [
                (DraftField::FirstName, first_name),
                (DraftField::LastName, last_name),
                (DraftField::Email, email),
                (DraftField::Phone, phone),
                (DraftField::Address, address),
            ];
            for (field, value) in overrides {
                if let Some(value) = value {
                    form.set_field(field, value);
                }
            }
            finish_submit(form.submit(&store).await, &mut events)?;
        }
        Command::Delete { id, yes } => {
            if !yes {
                bail!("refusing to delete contact {id} without --yes");
            }
            let deleted = store.delete(ContactId(id)).await;
            print_notices(&mut events);
            if !deleted {
                bail!(store
                    .last_error()
                    .await
                    .unwrap_or_else(|| "delete failed".to_string()));
            }
        }
    }

    Ok(())
}

fn finish_submit(
    outcome: SubmitOutcome,
    events: &mut broadcast::Receiver<StoreEvent>,
) -> Result<()> {
    print_notices(events);
    match outcome {
        SubmitOutcome::Saved => Ok(()),
        SubmitOutcome::Rejected(err) => bail!("{err}"),
        SubmitOutcome::Failed => bail!("contact was not saved"),
    }
}

/// Drains and prints the transient status messages the store published
/// since the last drain.
fn print_notices(events: &mut broadcast::Receiver<StoreEvent>) {
    while let Ok(event) = events.try_recv() {
        if let StoreEvent::Notice { severity, message } = event {
            match severity {
                NoticeSeverity::Error => eprintln!("! {message}"),
                _ => println!("* {message}"),
            }
        }
    }
}

fn print_contact(contact: &Contact) {
    println!(
        "#{} {} {}",
        contact.id.0, contact.first_name, contact.last_name
    );
    println!(
        "    {}, {}",
        contact.address.address, contact.address.city
    );
    println!("    {}", contact.phone);
    println!("    {}", contact.email);
    println!(
        "    {}",
        contact.image.as_deref().unwrap_or(FALLBACK_AVATAR_URL)
    );
}
