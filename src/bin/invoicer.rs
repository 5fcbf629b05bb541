use std::sync::Arc;

use anyhow::{anyhow, Result};
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use invoicer::chain::{QueryCapability, Session, SigningCapability};
use invoicer::client::{InvoiceClient, Operation};
use invoicer::config::{InitArgs, InvoicerConfig, DEFAULT_LCD_URL};
use invoicer::contract::{Invoice, InvoiceId};
use invoicer::lifecycle::{Event, Flow, LifecycleState, LifecycleTracker, Payload};
use invoicer::opts::{InvoicerCommand, InvoicerOpts};
use invoicer::rpc::{LcdClient, RemoteSigner};
use invoicer::Draft;

fn report(state: &LifecycleState) {
    if !state.message.is_empty() {
        println!("{}", state.message);
    }
}

fn print_invoice(invoice: &Invoice) {
    println!("Invoice #{}", invoice.id);
    if !invoice.issuer.is_empty() {
        println!("  Issuer:      {}", invoice.issuer);
    }
    println!("  Recipient:   {}", invoice.recipient);
    println!("  Amount:      {}", invoice.amount);
    println!("  Description: {}", invoice.description);
    println!("  Due date:    {}", invoice.due_date);
    println!("  Status:      {}", invoice.status());
}

fn load_config(opts: &InvoicerOpts) -> Result<InvoicerConfig> {
    let config = match &opts.config {
        Some(path) => InvoicerConfig::load(path)?,
        None => InvoicerConfig::discover(std::env::current_dir()?)?.0,
    };
    Ok(config)
}

fn connect(config: &InvoicerConfig, sender: &str) -> Result<Session> {
    match &config.network.signer_url {
        Some(url) => {
            let signer: Arc<dyn SigningCapability> =
                Arc::new(RemoteSigner::new(url, config.request_timeout())?);
            Ok(Session::connected(signer, sender))
        }
        None => Ok(Session::disconnected()),
    }
}

async fn fetch_into(
    client: &InvoiceClient,
    tracker: &mut LifecycleTracker,
    flow: Flow,
    id: &str,
) -> Option<Invoice> {
    tracker.dispatch(flow, Event::started("Fetching invoice..."));
    let result = client.fetch(id).await;
    let state = tracker.dispatch(
        flow,
        Event::from_result(Operation::Fetch, &result, |invoice| {
            Payload::Fetched(invoice.clone())
        }),
    );
    report(state);
    tracker.snapshot(flow).cloned().filter(|_| result.is_ok())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = InvoicerOpts::from_args();

    if let InvoicerCommand::Init {
        contract_address,
        lcd_url,
        signer_url,
        granter,
    } = &opts.command
    {
        let args = InitArgs {
            contract_address: contract_address.clone(),
            lcd_url: lcd_url.clone().unwrap_or_else(|| DEFAULT_LCD_URL.to_string()),
            signer_url: signer_url.clone(),
            granter: granter.clone(),
        };
        let path = InvoicerConfig::init(std::env::current_dir()?, &args)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = load_config(&opts)?;
    let query: Arc<dyn QueryCapability> = Arc::new(LcdClient::new(
        config.network.lcd_url.clone(),
        config.request_timeout(),
    )?);
    let client = InvoiceClient::from_config(&config, query);
    let mut tracker = LifecycleTracker::new();

    match opts.command {
        InvoicerCommand::Init { .. } => {}
        InvoicerCommand::Create {
            payer,
            description,
            due_date,
            items,
            sender,
        } => {
            let session = connect(&config, &sender)?;
            let draft = Draft::new(payer, description, due_date).with_items(items)?;
            println!("Total: {} {}", draft.total(), client.builder().denom());

            tracker.dispatch(Flow::Create, Event::started("Creating invoice..."));
            let result = client.create(&session, &draft).await;
            let state = tracker.dispatch(
                Flow::Create,
                Event::from_result(Operation::Create, &result, |id| Payload::Created(*id)),
            );
            report(state);
            result?;
        }
        InvoicerCommand::View { id } => {
            match fetch_into(&client, &mut tracker, Flow::View, &id).await {
                Some(invoice) => print_invoice(&invoice),
                None => return Err(anyhow!("could not fetch invoice {}", id)),
            }
        }
        InvoicerCommand::Pay { id, sender } => {
            let session = connect(&config, &sender)?;
            let snapshot = fetch_into(&client, &mut tracker, Flow::Pay, &id).await;
            if let Some(invoice) = &snapshot {
                print_invoice(invoice);
            }

            tracker.dispatch(Flow::Pay, Event::started("Processing payment..."));
            let result = client.pay(&session, &id, snapshot.as_ref()).await;
            let paid_id = snapshot.as_ref().map_or(InvoiceId(0), |invoice| invoice.id);
            let state = tracker.dispatch(
                Flow::Pay,
                Event::from_result(Operation::Pay, &result, |_| Payload::Paid(paid_id)),
            );
            report(state);
            let tx = result?;
            if let Some(hash) = &tx.transaction_hash {
                println!("Transaction: {}", hash);
            }

            // Show the status the chain now reports.
            if let Some(invoice) = fetch_into(&client, &mut tracker, Flow::Pay, &id).await {
                print_invoice(&invoice);
            }
        }
        InvoicerCommand::List { user } => {
            let invoices = client.list(&user).await.map_err(|err| {
                anyhow!("{}", err.user_message(Operation::List))
            })?;
            if invoices.is_empty() {
                println!("No invoices for {}", user);
            }
            for invoice in &invoices {
                print_invoice(invoice);
            }
        }
    }

    Ok(())
}
