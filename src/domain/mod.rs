pub mod account;
pub mod applicant;
pub mod application;
pub mod error;
pub mod ids;
pub mod score;
pub mod traits;
pub mod transaction;

pub use account::{CardDetails, CardNumber, LedgerAccount, Pin};
pub use applicant::{Applicant, Employment, Manager, NewApplicant, Principal, ProfileUpdate};
pub use application::{ApplicationStatus, CardApplication, CardProduct, Resolution};
pub use error::Error;
pub use ids::{AccountId, ApplicantId, ApplicationId, ManagerId, TransactionId};
pub use score::CreditScore;
pub use traits::{
    AuditEvent, AuditSink, DeadLetterQueue, InsightGenerator, Notification, NotificationKind,
    NotificationSink, Page, SecretHasher, SpendingSnapshot, Store, Versioned,
};
pub use transaction::{
    BalanceEffect, ReferenceCode, Transaction, TransactionKind, TransactionStatus,
};
