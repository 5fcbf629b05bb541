//! Definitions for command line interface

use std::path::PathBuf;
use structopt::StructOpt;

use crate::amount::LineItem;

#[derive(Debug, StructOpt)]
#[structopt(
    about = "Create, view, and pay invoices held by an invoice contract",
    name = "invoicer"
)]
pub struct InvoicerOpts {
    /// Path to `invoicer.toml`. Searched for upwards from the current directory when omitted.
    #[structopt(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[structopt(subcommand)]
    pub command: InvoicerCommand,
}

/// Enumeration of invoicer commands.
#[derive(Debug, StructOpt)]
pub enum InvoicerCommand {
    /// Write a new `invoicer.toml` into the current directory.
    #[structopt(name = "init", about = "Write a new invoicer.toml")]
    Init {
        /// Address of the invoice contract.
        #[structopt(long = "contract")]
        contract_address: String,
        /// LCD endpoint used for contract queries.
        #[structopt(long)]
        lcd_url: Option<String>,
        /// Endpoint of the signing service holding the wallet.
        #[structopt(long)]
        signer_url: Option<String>,
        /// Account paying transaction fees on creation.
        #[structopt(long)]
        granter: Option<String>,
    },

    /// Issue a new invoice.
    #[structopt(name = "create", alias = "c", about = "Issue a new invoice")]
    Create {
        /// Address expected to pay the invoice.
        #[structopt(long)]
        payer: String,
        #[structopt(long)]
        description: String,
        /// `YYYY-MM-DD` or an RFC 3339 timestamp.
        #[structopt(long)]
        due_date: String,
        /// Line item as `NAME=PRICE`. Repeat for up to five items.
        #[structopt(long = "item", short = "i", number_of_values = 1)]
        items: Vec<LineItem>,
        /// Wallet address submitting the transaction.
        #[structopt(long)]
        sender: String,
    },

    /// Show an invoice.
    #[structopt(name = "view", alias = "v", about = "Show an invoice")]
    View {
        /// Invoice id.
        id: String,
    },

    /// Pay an invoice with the amount it records.
    #[structopt(name = "pay", about = "Pay an invoice")]
    Pay {
        /// Invoice id.
        id: String,
        /// Wallet address paying the invoice.
        #[structopt(long)]
        sender: String,
    },

    /// List invoices issued by an address.
    #[structopt(name = "list", alias = "ls", about = "List invoices issued by an address")]
    List {
        user: String,
    },
}
