pub mod amount;
pub mod chain;
pub mod client;
pub mod config;
pub mod contract;
pub mod lifecycle;
pub mod opts;
pub mod rpc;

use lazy_static::lazy_static;
use tera::{self, Tera};

pub use amount::{checked_total, compute_total, validate_draft, Draft, LineItem, ValidationError};
pub use chain::{QueryCapability, Session, SigningCapability, TxResult};
pub use client::{ClientError, InvoiceClient, OpStatus, Operation};
pub use config::InvoicerConfig;
pub use contract::{Amount, Coin, DueDate, Invoice, InvoiceId};
pub use lifecycle::{Event, Flow, LifecycleState, LifecycleTracker, Phase};

include!(concat!(env!("OUT_DIR"), "/templates.rs"));

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        for path in TEMPLATE_FILES.file_names() {
            let name = path
                .strip_prefix("templates/")
                .expect("Failed to remove prefix");
            let content = {
                let file_contents = TEMPLATE_FILES.get(path).expect("read template");
                String::from_utf8(file_contents.to_vec()).expect("template contents")
            };

            tera.add_raw_template(name, &content)
                .expect("failed to add template");
        }
        tera
    };
}
