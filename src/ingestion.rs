use std::io::Read;
use std::pin::Pin;

use futures::stream::{self, Stream};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{Employment, Error};

/// One scripted operation against the issuance core. Handles (`actor`,
/// `app`) are caller-chosen labels; the engine resolves them to generated
/// ids as the script runs.
#[derive(Debug, Clone)]
pub enum Operation {
    Register {
        handle: String,
        name: String,
        age: u8,
        income: Decimal,
        experience: u8,
        employment: Employment,
        loan: Decimal,
    },
    RegisterManager {
        handle: String,
        name: String,
    },
    Submit {
        actor: String,
        label: Option<String>,
        bank: String,
        card: String,
        card_type: String,
        limit: Decimal,
    },
    Approve {
        actor: String,
        application: String,
        limit: Option<Decimal>,
    },
    Reject {
        actor: String,
        application: String,
        reason: String,
    },
    Purchase {
        actor: String,
        bank: String,
        amount: Decimal,
        merchant: String,
        category: String,
    },
    PayBill {
        actor: String,
        bank: String,
        amount: Decimal,
    },
    SetPin {
        actor: String,
        bank: String,
        pin: String,
    },
    CloseCard {
        actor: String,
        bank: String,
    },
    Insights {
        actor: String,
        bank: String,
    },
}

pub trait OperationStream {
    type Ops: Stream<Item = Result<Operation, Error>> + Send + Unpin + 'static;
    fn stream(&mut self) -> Self::Ops;
}

pub struct CsvReader<R: Read> {
    reader: Option<csv::Reader<R>>,
}

impl<R: Read> CsvReader<R> {
    pub fn new(reader: R) -> Result<Self, Error> {
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        Ok(Self { reader: Some(rdr) })
    }
}

/// Internal shape used only for CSV deserialization.
#[derive(Debug, Deserialize)]
struct CsvRow {
    op: String,
    actor: Option<String>,
    name: Option<String>,
    age: Option<u8>,
    income: Option<Decimal>,
    experience: Option<u8>,
    employment: Option<String>,
    loan: Option<Decimal>,
    bank: Option<String>,
    card: Option<String>,
    card_type: Option<String>,
    limit: Option<Decimal>,
    app: Option<String>,
    amount: Option<Decimal>,
    merchant: Option<String>,
    category: Option<String>,
    reason: Option<String>,
    pin: Option<String>,
}

fn required<T>(value: Option<T>, column: &str, op: &str) -> Result<T, Error> {
    value.ok_or_else(|| Error::Ingestion(format!("{op}: missing required column '{column}'")))
}

impl TryFrom<CsvRow> for Operation {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self, Self::Error> {
        let op = row.op.trim().to_ascii_lowercase();
        match op.as_str() {
            "register" => Ok(Operation::Register {
                handle: required(row.actor, "actor", &op)?,
                name: required(row.name, "name", &op)?,
                age: required(row.age, "age", &op)?,
                income: required(row.income, "income", &op)?,
                experience: required(row.experience, "experience", &op)?,
                employment: required(row.employment, "employment", &op)?.parse()?,
                loan: row.loan.unwrap_or(Decimal::ZERO),
            }),
            "register-manager" => Ok(Operation::RegisterManager {
                handle: required(row.actor, "actor", &op)?,
                name: required(row.name, "name", &op)?,
            }),
            "submit" => Ok(Operation::Submit {
                actor: required(row.actor, "actor", &op)?,
                label: row.app,
                bank: required(row.bank, "bank", &op)?,
                card: required(row.card, "card", &op)?,
                card_type: row.card_type.unwrap_or_else(|| "Standard".to_string()),
                limit: required(row.limit, "limit", &op)?,
            }),
            "approve" => Ok(Operation::Approve {
                actor: required(row.actor, "actor", &op)?,
                application: required(row.app, "app", &op)?,
                limit: row.limit,
            }),
            "reject" => Ok(Operation::Reject {
                actor: required(row.actor, "actor", &op)?,
                application: required(row.app, "app", &op)?,
                reason: required(row.reason, "reason", &op)?,
            }),
            "purchase" => Ok(Operation::Purchase {
                actor: required(row.actor, "actor", &op)?,
                bank: required(row.bank, "bank", &op)?,
                amount: required(row.amount, "amount", &op)?,
                merchant: row
                    .merchant
                    .unwrap_or_else(|| "Unknown Merchant".to_string()),
                category: row.category.unwrap_or_else(|| "Other".to_string()),
            }),
            "pay-bill" => Ok(Operation::PayBill {
                actor: required(row.actor, "actor", &op)?,
                bank: required(row.bank, "bank", &op)?,
                amount: required(row.amount, "amount", &op)?,
            }),
            "set-pin" => Ok(Operation::SetPin {
                actor: required(row.actor, "actor", &op)?,
                bank: required(row.bank, "bank", &op)?,
                pin: required(row.pin, "pin", &op)?,
            }),
            "close-card" => Ok(Operation::CloseCard {
                actor: required(row.actor, "actor", &op)?,
                bank: required(row.bank, "bank", &op)?,
            }),
            "insights" => Ok(Operation::Insights {
                actor: required(row.actor, "actor", &op)?,
                bank: required(row.bank, "bank", &op)?,
            }),
            other => Err(Error::Ingestion(format!("Invalid operation: {other}"))),
        }
    }
}

impl<R: Read + Send + 'static> OperationStream for CsvReader<R> {
    type Ops = Pin<Box<dyn Stream<Item = Result<Operation, Error>> + Send>>;

    fn stream(&mut self) -> Self::Ops {
        // Take ownership of the reader so the iterator we build owns all
        // data and is 'static.
        let reader = match self.reader.take() {
            Some(r) => r,
            None => {
                // Already consumed; return an empty stream.
                return Box::pin(stream::iter(Vec::<Result<Operation, Error>>::new()));
            }
        };

        let iter = reader
            .into_deserialize::<CsvRow>()
            .map(|row_res| match row_res {
                Ok(row) => Operation::try_from(row),
                Err(e) => Err(Error::Ingestion(format!(
                    "CSV deserialization error: {e}"
                ))),
            });

        Box::pin(stream::iter(iter))
    }
}
