use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

#[test]
fn end_to_end_outputs_expected_account_report() {
    // Script the full lifecycle: two customers register, both apply, one
    // application is approved and transacted against, the other rejected.
    // Bad rows (over-cap purchase, duplicate same-bank application) are
    // dead-lettered without stopping the run.
    let mut file = NamedTempFile::new().expect("create temp file");
    writeln!(
        file,
        "op,actor,name,age,income,experience,employment,loan,bank,card,card_type,limit,app,amount,merchant,category,reason,pin\n\
        register,alice,Alice Kumar,30,600000,3,salaried,0,,,,,,,,,,\n\
        register,bob,Bob Singh,40,250000,1,unemployed,200000,,,,,,,,,,\n\
        register-manager,mgr,Meera Iyer,,,,,,,,,,,,,,,\n\
        submit,alice,,,,,,,HDFC Bank,Millennia,Rewards,100000,app1,,,,,\n\
        submit,bob,,,,,,,ICICI Bank,Platinum,Standard,50000,app2,,,,,\n\
        approve,mgr,,,,,,,,,,,app1,,,,,\n\
        reject,mgr,,,,,,,,,,,app2,,,,Income below policy threshold,\n\
        purchase,alice,,,,,,,HDFC Bank,,,,,5000,Vista Mart,Groceries,,\n\
        pay-bill,alice,,,,,,,HDFC Bank,,,,,2000,,,,\n\
        set-pin,alice,,,,,,,HDFC Bank,,,,,,,,,1234\n\
        purchase,alice,,,,,,,HDFC Bank,,,,,200000,Vista Mart,Groceries,,\n\
        submit,alice,,,,,,,HDFC Bank,Regalia,Premium,100000,app3,,,,,\n\
        insights,alice,,,,,,,HDFC Bank,,,,,,,,,"
    )
    .unwrap();

    let exe = env!("CARGO_BIN_EXE_issuance_engine");
    let mut cmd = Command::new(exe);
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "applicant,bank,card_type,credit_limit,current_balance,available_credit,active",
        ))
        .stdout(predicate::str::contains(
            "Alice Kumar,HDFC Bank,Rewards,100000.00,3000.00,97000.00,true",
        ))
        // Bob's application was rejected, so no account row exists for him.
        .stdout(predicate::str::contains("Bob Singh").not())
        // The over-cap purchase and the duplicate HDFC application were
        // dead-lettered.
        .stderr(predicate::str::contains("dead-lettered"));
}

#[test]
fn unknown_operations_are_dead_lettered_not_fatal() {
    let mut file = NamedTempFile::new().expect("create temp file");
    writeln!(
        file,
        "op,actor,name,age,income,experience,employment,loan,bank,card,card_type,limit,app,amount,merchant,category,reason,pin\n\
        teleport,alice,,,,,,,,,,,,,,,,\n\
        register,alice,Alice Kumar,30,600000,3,salaried,0,,,,,,,,,,"
    )
    .unwrap();

    let exe = env!("CARGO_BIN_EXE_issuance_engine");
    let mut cmd = Command::new(exe);
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Invalid operation: teleport"));
}
