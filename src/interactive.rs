use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::account::{AccountStore, AccountUpdate};
use crate::batch::{BatchReport, CheckInResult, Orchestrator};
use crate::error::{RollcallError, StoreError};
use crate::goto::extract_goto;
use crate::scanner::{scan_goto, LineQrSource};
use crate::session::{CheckInForm, SubmitPlan};

const GREEN: &str = "\x1B[32m";
const RED: &str = "\x1B[31m";
const RESET: &str = "\x1B[0m";

/// Menu-driven terminal client. Reads commands from `reader` and writes to
/// `writer`, so the whole flow can be scripted.
pub struct Console<R, W> {
    reader: R,
    writer: W,
    store: AccountStore,
    form: CheckInForm,
    orchestrator: Orchestrator,
    last_report: Option<BatchReport>,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(reader: R, writer: W, store: AccountStore, orchestrator: Orchestrator) -> Self {
        Self {
            reader,
            writer,
            store,
            form: CheckInForm::new(),
            orchestrator,
            last_report: None,
        }
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    pub fn form(&self) -> &CheckInForm {
        &self.form
    }

    pub fn last_report(&self) -> Option<&BatchReport> {
        self.last_report.as_ref()
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Run until the user quits or input ends.
    pub async fn run(&mut self) -> io::Result<()> {
        self.print_banner()?;
        loop {
            self.print_menu()?;
            let Some(choice) = self.prompt("Select Option: ")? else {
                break;
            };
            match choice.as_str() {
                "1" => self.add_account()?,
                "2" => self.edit_account()?,
                "3" => self.remove_account()?,
                "4" => self.clear_accounts()?,
                "5" => self.toggle_account()?,
                "6" => self.toggle_all()?,
                "7" => self.enter_goto()?,
                "8" => self.scan()?,
                "9" => self.enter_manual_credentials()?,
                "s" | "S" => self.submit().await?,
                "q" | "Q" => break,
                "" => {}
                _ => writeln!(self.writer, "Invalid option.")?,
            }
        }
        writeln!(self.writer, "\nSession ended.")?;
        Ok(())
    }

    fn print_banner(&mut self) -> io::Result<()> {
        writeln!(self.writer, "========================================")?;
        writeln!(self.writer, "          NKUST 自動點名 (Rollcall)       ")?;
        writeln!(self.writer, "========================================")
    }

    fn print_menu(&mut self) -> io::Result<()> {
        let goto = if self.form.goto.is_empty() {
            "(not set)".to_string()
        } else {
            self.form.goto.clone()
        };
        writeln!(self.writer, "\nGoto: {}", goto)?;
        self.print_accounts()?;

        writeln!(self.writer, "1. Add account")?;
        writeln!(self.writer, "2. Edit account")?;
        writeln!(self.writer, "3. Remove account")?;
        writeln!(self.writer, "4. Clear all accounts")?;
        writeln!(self.writer, "5. Toggle account selection")?;
        writeln!(self.writer, "6. Select all / none")?;
        writeln!(self.writer, "7. Enter goto")?;
        writeln!(self.writer, "8. Scan QR code")?;
        if self.store.is_empty() {
            writeln!(self.writer, "9. Enter username/password")?;
        }
        writeln!(self.writer, "s. Submit check-in")?;
        writeln!(self.writer, "q. Quit")
    }

    fn print_accounts(&mut self) -> io::Result<()> {
        writeln!(self.writer, "Saved accounts ({}):", self.store.len())?;
        if self.store.is_empty() {
            let user = if self.form.username.is_empty() {
                "(none)"
            } else {
                self.form.username.as_str()
            };
            writeln!(self.writer, "  No saved accounts. Manual login: {}", user)?;
            return Ok(());
        }
        for (i, account) in self.store.accounts().iter().enumerate() {
            let mark = if self.form.is_selected(&account.id) { "x" } else { " " };
            if account.label.is_some() {
                writeln!(
                    self.writer,
                    "  [{}] {}. {} ({})",
                    mark,
                    i + 1,
                    account.display_label(),
                    account.username
                )?;
            } else {
                writeln!(self.writer, "  [{}] {}. {}", mark, i + 1, account.username)?;
            }
        }
        Ok(())
    }

    /// `None` on end of input
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.writer, "{}", label)?;
        self.writer.flush()?;
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
            // The offending line is already consumed; reject it and carry on
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!("Rejected input line: {}", e);
                writeln!(self.writer, "Invalid input.")?;
                Ok(Some(String::new()))
            }
            Err(e) => Err(e),
        }
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.prompt(&format!("{} [y/N]: ", question))?;
        Ok(matches!(answer.as_deref().map(str::trim), Some("y") | Some("Y")))
    }

    /// 1-based index into the account list, mapped to an id
    fn pick_account(&mut self) -> io::Result<Option<String>> {
        if self.store.is_empty() {
            writeln!(self.writer, "No saved accounts.")?;
            return Ok(None);
        }
        let Some(input) = self.prompt("Account #: ")? else {
            return Ok(None);
        };
        let picked = input
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.store.accounts().get(i))
            .map(|a| a.id.clone());
        if picked.is_none() {
            writeln!(self.writer, "No such account.")?;
        }
        Ok(picked)
    }

    fn report_store_error(&mut self, result: Result<(), StoreError>) -> io::Result<()> {
        if let Err(e) = result {
            warn!("Account storage failed: {}", e);
            writeln!(self.writer, "❌ Could not save accounts: {}", e)?;
        }
        Ok(())
    }

    fn add_account(&mut self) -> io::Result<()> {
        let Some(label) = self.prompt("Label (optional): ")? else {
            return Ok(());
        };
        let Some(username) = self.prompt("Username: ")? else {
            return Ok(());
        };
        let Some(password) = self.prompt("Password: ")? else {
            return Ok(());
        };
        let username = username.trim().to_string();
        if username.is_empty() || password.is_empty() {
            writeln!(self.writer, "Username and password are required.")?;
            return Ok(());
        }

        let label = Some(label.trim().to_string()).filter(|l| !l.is_empty());
        match self.store.add(username, password, label) {
            Ok(account) => {
                writeln!(self.writer, "✅ Saved {}", account.display_label())?;
                Ok(())
            }
            Err(e) => self.report_store_error(Err(e)),
        }
    }

    fn edit_account(&mut self) -> io::Result<()> {
        let Some(id) = self.pick_account()? else {
            return Ok(());
        };
        writeln!(self.writer, "Leave blank to keep the current value. '-' clears the label.")?;

        let mut update = AccountUpdate::default();
        if let Some(label) = self.prompt("Label: ")? {
            match label.trim() {
                "" => {}
                "-" => update.label = Some(None),
                l => update.label = Some(Some(l.to_string())),
            }
        }
        if let Some(username) = self.prompt("Username: ")? {
            if !username.trim().is_empty() {
                update.username = Some(username.trim().to_string());
            }
        }
        if let Some(password) = self.prompt("Password: ")? {
            if !password.is_empty() {
                update.password = Some(password);
            }
        }

        if update.is_empty() {
            writeln!(self.writer, "Nothing changed.")?;
            return Ok(());
        }
        let result = self.store.update(&id, update);
        self.report_store_error(result)
    }

    fn remove_account(&mut self) -> io::Result<()> {
        let Some(id) = self.pick_account()? else {
            return Ok(());
        };
        let name = self
            .store
            .get(&id)
            .map(|a| a.display_label().to_string())
            .unwrap_or_default();
        if !self.confirm(&format!("Delete account {}?", name))? {
            return Ok(());
        }
        let result = self.store.remove(&id);
        self.form.retain_existing(&self.store);
        self.report_store_error(result)
    }

    fn clear_accounts(&mut self) -> io::Result<()> {
        if self.store.is_empty() {
            writeln!(self.writer, "No saved accounts.")?;
            return Ok(());
        }
        if !self.confirm("Delete ALL saved accounts?")? {
            return Ok(());
        }
        let result = self.store.clear();
        self.form.retain_existing(&self.store);
        self.report_store_error(result)
    }

    fn toggle_account(&mut self) -> io::Result<()> {
        if let Some(id) = self.pick_account()? {
            self.form.toggle(&id);
        }
        Ok(())
    }

    fn toggle_all(&mut self) -> io::Result<()> {
        let all_selected = self
            .store
            .accounts()
            .iter()
            .all(|a| self.form.is_selected(&a.id));
        if all_selected {
            self.form.clear_selection();
        } else {
            self.form.select_all(&self.store);
        }
        Ok(())
    }

    fn enter_goto(&mut self) -> io::Result<()> {
        let Some(input) = self.prompt("Goto (value or URL): ")? else {
            return Ok(());
        };
        let input = input.trim();
        if input.is_empty() {
            return Ok(());
        }
        // A pasted URL is reduced to its goto; anything else is taken as-is
        self.form.goto = extract_goto(input).unwrap_or_else(|| input.to_string());
        Ok(())
    }

    fn scan(&mut self) -> io::Result<()> {
        writeln!(
            self.writer,
            "Scan the QR code (one code per line, empty line closes the scanner)."
        )?;
        self.writer.flush()?;

        let mut source = LineQrSource::new(&mut self.reader);
        match scan_goto(&mut source) {
            Ok(Some(goto)) => {
                self.form.goto = goto;
                writeln!(self.writer, "✅ Goto captured.")
            }
            Ok(None) => writeln!(self.writer, "Scanner closed, goto unchanged."),
            Err(e) => {
                warn!("Scan failed: {}", e);
                writeln!(self.writer, "❌ Scanner error, goto unchanged.")
            }
        }
    }

    fn enter_manual_credentials(&mut self) -> io::Result<()> {
        if !self.store.is_empty() {
            writeln!(self.writer, "Saved accounts exist; select them instead.")?;
            return Ok(());
        }
        if let Some(username) = self.prompt("Username: ")? {
            self.form.username = username.trim().to_string();
        }
        if let Some(password) = self.prompt("Password: ")? {
            self.form.password = password;
        }
        Ok(())
    }

    async fn submit(&mut self) -> io::Result<()> {
        let plan = match self.form.plan(&self.store) {
            Ok(plan) => plan,
            Err(e) => {
                let hint = match &e {
                    RollcallError::NoAccountsSelected => "Select at least one account first.",
                    RollcallError::MissingGoto => "Enter or scan a goto first.",
                    RollcallError::MissingCredentials => "Enter username and password first.",
                    _ => "",
                };
                writeln!(self.writer, "❌ {} {}", e, hint)?;
                return Ok(());
            }
        };

        writeln!(self.writer, "點名中...")?;
        self.writer.flush()?;

        let outcome = match plan {
            SubmitPlan::Manual {
                username,
                password,
                goto,
            } => self
                .orchestrator
                .run_single(&username, &password, &goto)
                .await
                .map(|r| BatchReport { results: vec![r] }),
            SubmitPlan::Batch { accounts, goto } => {
                self.orchestrator.run_batch(&accounts, &goto).await
            }
        };

        match outcome {
            Ok(report) => {
                self.print_report(&report)?;
                self.last_report = Some(report);
            }
            Err(e) => writeln!(self.writer, "❌ {}", e)?,
        }
        Ok(())
    }

    fn print_report(&mut self, report: &BatchReport) -> io::Result<()> {
        for result in &report.results {
            self.print_result(result)?;
        }
        if report.len() > 1 {
            writeln!(
                self.writer,
                "Done: {} succeeded, {} failed",
                report.succeeded(),
                report.failed()
            )?;
        }
        Ok(())
    }

    fn print_result(&mut self, result: &CheckInResult) -> io::Result<()> {
        let (color, icon) = if result.success { (GREEN, "✅") } else { (RED, "❌") };
        writeln!(
            self.writer,
            "{}{} {}: {}{}",
            color, icon, result.account_label, result.message, RESET
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::MemoryBackend;
    use crate::client::{CheckInEndpoint, CheckInOutcome, CheckInRequest};
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Accepts everyone except usernames starting with "bad".
    #[derive(Default)]
    struct Gate {
        seen: Mutex<Vec<CheckInRequest>>,
    }

    #[async_trait]
    impl CheckInEndpoint for Gate {
        async fn check_in(&self, request: &CheckInRequest) -> CheckInOutcome {
            self.seen.lock().unwrap().push(request.clone());
            if request.username.starts_with("bad") {
                CheckInOutcome::failure("登入失敗")
            } else {
                CheckInOutcome::success("點名成功")
            }
        }
    }

    fn console(
        script: impl AsRef<[u8]>,
        store: AccountStore,
    ) -> (Console<Cursor<Vec<u8>>, Vec<u8>>, Arc<Gate>) {
        let gate = Arc::new(Gate::default());
        let console = Console::new(
            Cursor::new(script.as_ref().to_vec()),
            Vec::new(),
            store,
            Orchestrator::new(gate.clone()),
        );
        (console, gate)
    }

    #[tokio::test]
    async fn test_batch_flow_through_menu() {
        let backend = MemoryBackend::new();
        let script = [
            "1", "Alice", "good1", "pw1", // add
            "1", "", "bad2", "pw2", // add
            "6", // select all
            "8", "not a code", "https://example.edu/r?goto=tok42", // scan
            "s", "q",
        ]
        .join("\n")
            + "\n";
        let (mut console, gate) = console(&script, AccountStore::open(backend.clone()));

        console.run().await.unwrap();

        let report = console.last_report().unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.results[0].account_label, "Alice");
        assert!(!report.results[1].success);

        let seen = gate.seen.lock().unwrap();
        assert!(seen.iter().all(|r| r.rollcall_goto == "tok42"));

        assert_eq!(AccountStore::open(backend).len(), 2);

        let out = String::from_utf8(console.into_writer()).unwrap();
        assert!(out.contains("Alice: 點名成功"));
        assert!(out.contains("bad2: 登入失敗"));
        assert!(out.contains("Done: 1 succeeded, 1 failed"));
    }

    #[tokio::test]
    async fn test_manual_flow_without_saved_accounts() {
        let script = "9\nC110152301\nsecret\n7\ngoto=abc&x=1\ns\n";
        let (mut console, gate) = console(script, AccountStore::open(MemoryBackend::new()));

        console.run().await.unwrap();

        let seen = gate.seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &[CheckInRequest {
                username: "C110152301".into(),
                password: "secret".into(),
                rollcall_goto: "abc".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_submit_without_selection_is_refused() {
        let mut store = AccountStore::open(MemoryBackend::new());
        store.add("good".into(), "pw".into(), None).unwrap();
        let (mut console, gate) = console("7\ntok\ns\nq\n", store);

        console.run().await.unwrap();

        assert!(gate.seen.lock().unwrap().is_empty());
        assert!(console.last_report().is_none());
        let out = String::from_utf8(console.into_writer()).unwrap();
        assert!(out.contains("Select at least one account first."));
    }

    #[tokio::test]
    async fn test_edit_remove_and_clear() {
        let backend = MemoryBackend::new();
        let mut store = AccountStore::open(backend.clone());
        store.add("u1".into(), "p1".into(), Some("One".into())).unwrap();
        store.add("u2".into(), "p2".into(), None).unwrap();

        let script = [
            "2", "1", "-", "u1x", "", // edit first: clear label, new username
            "5", "2", // select second
            "3", "2", "y", // remove second
            "4", "n", // clear, declined
            "q",
        ]
        .join("\n")
            + "\n";
        let (mut console, _) = console(&script, store);
        console.run().await.unwrap();

        let accounts = console.store().accounts().to_vec();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].username, "u1x");
        assert_eq!(accounts[0].password, "p1");
        assert_eq!(accounts[0].label, None);
        assert!(console.form().selected_accounts(console.store()).is_empty());

        assert_eq!(AccountStore::open(backend).accounts(), accounts.as_slice());
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_session_usable() {
        let backend = MemoryBackend::new();
        backend.set_fail_writes(true);
        let script = "1\n\nu1\np1\nq\n";
        let (mut console, _) = console(script, AccountStore::open(backend));

        console.run().await.unwrap();

        assert!(console.store().is_empty());
        let out = String::from_utf8(console.into_writer()).unwrap();
        assert!(out.contains("Could not save accounts"));
        assert!(out.contains("Session ended."));
    }

    #[tokio::test]
    async fn test_scan_error_keeps_session_running() {
        let script: &[u8] = b"7\ntok\n8\n\xff\xfe garbage\nq\n";
        let (mut console, _) = console(script, AccountStore::open(MemoryBackend::new()));

        console.run().await.unwrap();

        assert_eq!(console.form().goto, "tok");
        let out = String::from_utf8(console.into_writer()).unwrap();
        assert!(out.contains("Scanner error, goto unchanged."));
        assert!(out.contains("Session ended."));
    }

    #[tokio::test]
    async fn test_undecodable_menu_line_is_rejected() {
        let script: &[u8] = b"\xff\n7\nabc\nq\n";
        let (mut console, _) = console(script, AccountStore::open(MemoryBackend::new()));

        console.run().await.unwrap();

        assert_eq!(console.form().goto, "abc");
        let out = String::from_utf8(console.into_writer()).unwrap();
        assert!(out.contains("Invalid input."));
        assert!(out.contains("Session ended."));
    }

    #[tokio::test]
    async fn test_scan_without_goto_keeps_previous() {
        let script = "7\nold\n8\nhttps://example.edu/r?token=abc\ngoto=\n\nq\n";
        let (mut console, _) = console(script, AccountStore::open(MemoryBackend::new()));

        console.run().await.unwrap();

        assert_eq!(console.form().goto, "old");
        let out = String::from_utf8(console.into_writer()).unwrap();
        assert!(out.contains("Scanner closed, goto unchanged."));
    }
}
