//! Subcommands, each a thin wrapper over one dashboard service call.

use std::future::Future;

use anyhow::{Context, anyhow, bail};
use chrono::{Datelike, Local};
use clap::{Args, Subcommand};
use dialoguer::{Confirm, Password};
use models::{
    client::ClientDraft,
    finance::{FinanceDraft, FinanceKind},
    project::{Project, ProjectDraft, ProjectStatus},
    resource::DocumentId,
};
use services::{
    DashboardServices,
    services::{
        auth::Credentials,
        confirmation::{ConfirmationService, PendingConfirmation},
        forms,
        navigation::Route,
        resource::{DeleteError, ViewScope},
    },
};
use tokio::task::JoinHandle;
use tracing::debug;
use utils::{
    money::format_price,
    pagination::{self, DEFAULT_PAGE_SIZE, FULL_LISTING_PAGE_SIZE},
};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long, env = "DASHBOARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List clients
    Clients(PageArgs),
    /// Add a client
    AddClient {
        title: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List projects
    Projects(PageArgs),
    /// Show one project with its finances
    Project { document_id: String },
    /// Add a project
    AddProject {
        title: String,
        #[command(flatten)]
        fields: ProjectArgs,
    },
    /// Edit a project; omitted fields keep their current values
    UpdateProject {
        document_id: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: ProjectArgs,
    },
    /// Delete a project after confirmation
    DeleteProject(DeleteArgs),
    /// Delete a client after confirmation
    DeleteClient(DeleteArgs),
    /// Incomes and expenses, newest first
    Finances {
        #[arg(long, default_value_t = FULL_LISTING_PAGE_SIZE)]
        limit: u32,
    },
    /// Record an income or expense
    AddFinance {
        #[arg(long, value_enum)]
        kind: FinanceKindArg,
        amount: i64,
        description: String,
        /// YYYY-MM-DD, today when omitted
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        #[arg(long)]
        payment_method: Option<String>,
        /// Owning project document id
        #[arg(long)]
        project: Option<String>,
    },
    /// Monthly income and outcome for a year
    Summary {
        /// Defaults to the current year
        year: Option<i32>,
    },
    /// Delete an income after confirmation
    DeleteIncome(DeleteArgs),
    /// Delete an expense after confirmation
    DeleteExpense(DeleteArgs),
}

#[derive(Debug, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub document_id: String,
    /// Answer the confirmation with yes
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub budget: Option<i64>,
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<chrono::NaiveDate>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub end_date: Option<chrono::NaiveDate>,
    /// Client document id
    #[arg(long)]
    pub client: Option<String>,
}

impl ProjectArgs {
    /// Overlay the given flags on `draft`.
    pub fn apply(self, draft: &mut ProjectDraft) {
        if self.description.is_some() {
            draft.description = self.description;
        }
        if self.budget.is_some() {
            draft.budget = self.budget;
        }
        if let Some(status) = self.status {
            draft.project_status = Some(status.into());
        }
        if self.start_date.is_some() {
            draft.start_date = self.start_date;
        }
        if self.end_date.is_some() {
            draft.end_date = self.end_date;
        }
        if let Some(client) = self.client {
            draft.client = Some(DocumentId::new(client));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatusArg {
    Queued,
    InProgress,
    InReview,
    Completed,
}

impl From<StatusArg> for ProjectStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Queued => ProjectStatus::Queued,
            StatusArg::InProgress => ProjectStatus::InProgress,
            StatusArg::InReview => ProjectStatus::InReview,
            StatusArg::Completed => ProjectStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum FinanceKindArg {
    Income,
    Expense,
}

impl From<FinanceKindArg> for FinanceKind {
    fn from(kind: FinanceKindArg) -> Self {
        match kind {
            FinanceKindArg::Income => FinanceKind::Income,
            FinanceKindArg::Expense => FinanceKind::Expense,
        }
    }
}

pub async fn run(app: &DashboardServices, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => login(app, email, password).await,
        Command::Logout => {
            app.auth.logout().await;
            println!("Logged out");
            Ok(())
        }
        Command::Whoami => {
            match app.session.user() {
                Some(user) => println!("{} <{}>", user.username, user.email),
                None if app.session.is_authenticated() => println!("Signed in"),
                None => println!("Not signed in"),
            }
            Ok(())
        }
        Command::Clients(args) => {
            require(app, Route::Clients)?;
            list_clients(app, args).await
        }
        Command::AddClient {
            title,
            email,
            phone,
            notes,
        } => {
            require(app, Route::Clients)?;
            let draft = ClientDraft {
                title: Some(title),
                email,
                phone,
                notes,
            };
            let client = forms::submit_client(&app.clients, &draft)
                .await
                .map_err(|e| anyhow!(e.message()))?;
            println!("Created client {} ({})", client.title, client.document_id);
            Ok(())
        }
        Command::Projects(args) => {
            require(app, Route::Projects)?;
            list_projects(app, args).await
        }
        Command::Project { document_id } => {
            let id = DocumentId::new(document_id);
            require(app, Route::Project(id.clone()))?;
            show_project(app, &id).await
        }
        Command::AddProject { title, fields } => {
            require(app, Route::Projects)?;
            let mut draft = ProjectDraft {
                title: Some(title),
                ..Default::default()
            };
            fields.apply(&mut draft);
            let project = forms::submit_project(&app.projects, &draft)
                .await
                .map_err(|e| anyhow!(e.message()))?;
            println!("Created project {} ({})", project.title, project.document_id);
            Ok(())
        }
        Command::UpdateProject {
            document_id,
            title,
            fields,
        } => {
            let id = DocumentId::new(document_id);
            require(app, Route::Project(id.clone()))?;
            let current = app
                .projects
                .get(&id)
                .await?
                .context("project unavailable")?;

            let mut draft = ProjectDraft::from(&current);
            if title.is_some() {
                draft.title = title;
            }
            fields.apply(&mut draft);
            let project = forms::update_project(&app.projects, &id, &draft)
                .await
                .map_err(|e| anyhow!(e.message()))?;
            println!(
                "Updated project {} [{}]",
                project.title, project.project_status
            );
            Ok(())
        }
        Command::DeleteProject(args) => {
            require(app, Route::Projects)?;
            confirmed_delete(app, "project", args, |id| async move {
                app.projects.delete_confirmed(&app.confirmations, &id).await
            })
            .await
        }
        Command::DeleteClient(args) => {
            require(app, Route::Clients)?;
            confirmed_delete(app, "client", args, |id| async move {
                app.clients.delete_confirmed(&app.confirmations, &id).await
            })
            .await
        }
        Command::Finances { limit } => {
            require(app, Route::Finances)?;
            list_finances(app, limit).await
        }
        Command::AddFinance {
            kind,
            amount,
            description,
            date,
            payment_method,
            project,
        } => {
            require(app, Route::Finances)?;
            let draft = FinanceDraft {
                amount: Some(amount),
                description: Some(description),
                date: Some(date.unwrap_or_else(|| Local::now().date_naive())),
                payment_method,
                project: project.map(DocumentId::new),
            };
            let entry = forms::submit_finance(&app.incomes, &app.expenses, kind.into(), &draft)
                .await
                .map_err(|e| anyhow!(e.message()))?;
            println!(
                "Recorded {} {} ({})",
                entry.kind,
                format_price(entry.amount),
                entry.document_id
            );
            Ok(())
        }
        Command::Summary { year } => {
            require(app, Route::Dashboard)?;
            summary(app, year.unwrap_or_else(|| Local::now().year())).await
        }
        Command::DeleteIncome(args) => {
            require(app, Route::Finances)?;
            confirmed_delete(app, "income", args, |id| async move {
                app.finances.delete_entry(FinanceKind::Income, &id).await
            })
            .await
        }
        Command::DeleteExpense(args) => {
            require(app, Route::Finances)?;
            confirmed_delete(app, "expense", args, |id| async move {
                app.finances.delete_entry(FinanceKind::Expense, &id).await
            })
            .await
        }
    }
}

/// Refuse private commands without a session, the way the router redirects to login.
fn require(app: &DashboardServices, route: Route) -> anyhow::Result<()> {
    if app.navigate(route) == Route::Login {
        bail!("not signed in; run `dashboard login --email <email>` first");
    }
    Ok(())
}

async fn login(
    app: &DashboardServices,
    email: String,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => tokio::task::spawn_blocking(|| Password::new().with_prompt("Password").interact())
            .await?
            .context("failed to read password")?,
    };

    let route = app
        .auth
        .submit(&Credentials::new(email, password))
        .await
        .map_err(|e| anyhow!("{e}"))?;
    debug!(route = %route, "Login redirect");

    let name = app
        .session
        .user()
        .map(|u| u.username)
        .unwrap_or_default();
    println!("Signed in as {name}");
    Ok(())
}

async fn list_clients(app: &DashboardServices, args: PageArgs) -> anyhow::Result<()> {
    let scope = ViewScope::new();
    let page = app
        .clients
        .list_in(&scope.handle(), args.page, args.page_size)
        .await?
        .ready()
        .context("client list unavailable")?;

    for client in &page.items {
        println!(
            "{:<24} {:<32} {:<28} {}",
            client.document_id,
            client.title,
            client.email.as_deref().unwrap_or("-"),
            client.phone.as_deref().unwrap_or("-"),
        );
    }
    print_page_footer(page.page, page.total_pages(), page.total);
    Ok(())
}

async fn list_projects(app: &DashboardServices, args: PageArgs) -> anyhow::Result<()> {
    let page = app
        .projects
        .list(args.page, args.page_size)
        .await?
        .context("project list unavailable")?;

    for project in &page.items {
        println!(
            "{:<24} {:<32} {:<12} {}",
            project.document_id,
            project.title,
            project.project_status,
            project
                .client
                .as_ref()
                .map_or("-", |c| c.title.as_str()),
        );
    }
    print_page_footer(page.page, page.total_pages(), page.total);
    Ok(())
}

fn print_page_footer(page: u32, total_pages: u32, total: u64) {
    println!(
        "page {page}/{total_pages} ({total} total); prev {} next {}",
        pagination::previous_page(page),
        pagination::next_page(page, total_pages),
    );
}

async fn show_project(app: &DashboardServices, id: &DocumentId) -> anyhow::Result<()> {
    let project: Project = app
        .projects
        .get(id)
        .await?
        .context("project unavailable")?;

    println!("{} [{}]", project.title, project.project_status);
    if let Some(description) = &project.description {
        println!("{description}");
    }
    if let Some(budget) = project.budget {
        println!("Budget: {}", format_price(budget));
    }
    if let (Some(start), Some(end)) = (project.start_date, project.end_date) {
        println!("Schedule: {start} .. {end}");
    }
    if project.project_status == ProjectStatus::Completed {
        println!("Completed");
    }
    for entry in project.finance_entries() {
        println!(
            "  {} {:<8} {:>16} {}",
            entry.date,
            entry.kind,
            format_price(entry.signed_amount()),
            entry.description
        );
    }
    println!("Balance: {}", format_price(project.financial_total()));
    Ok(())
}

async fn list_finances(app: &DashboardServices, limit: u32) -> anyhow::Result<()> {
    let ledger = app
        .finances
        .ledger(limit)
        .await?
        .context("finances unavailable")?;

    for entry in &ledger.entries {
        println!(
            "{} {:<8} {:>16} {:<10} {}",
            entry.date,
            entry.kind,
            format_price(entry.signed_amount()),
            entry.payment_method.as_deref().unwrap_or("-"),
            entry.description,
        );
    }
    println!("Total: {}", format_price(ledger.total));
    Ok(())
}

async fn summary(app: &DashboardServices, year: i32) -> anyhow::Result<()> {
    let months = app
        .finances
        .monthly_summary(year, FULL_LISTING_PAGE_SIZE)
        .await?
        .context("finances unavailable")?;

    for month in &months {
        println!(
            "{year}-{:02} income {:>16} outcome {:>16} net {:>16}",
            month.month,
            format_price(month.income),
            format_price(month.outcome),
            format_price(month.net()),
        );
    }
    Ok(())
}

/// Run a confirmation-guarded delete while the terminal answers the dialog.
async fn confirmed_delete<F, Fut>(
    app: &DashboardServices,
    label: &str,
    args: DeleteArgs,
    delete: F,
) -> anyhow::Result<()>
where
    F: FnOnce(DocumentId) -> Fut,
    Fut: Future<Output = Result<Option<DocumentId>, DeleteError>>,
{
    let prompt = answer_confirmations(app.confirmations.clone(), args.yes);
    let outcome = delete(DocumentId::new(args.document_id)).await;
    prompt.abort();

    match outcome {
        Ok(Some(deleted)) => println!("Deleted {label} {deleted}"),
        Ok(None) => println!("Cancelled"),
        Err(DeleteError::Api(e)) => bail!(e.user_message()),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Answer the next confirmation dialog on the terminal (or with yes when `assume_yes`).
fn answer_confirmations(confirmations: ConfirmationService, assume_yes: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rx = confirmations.subscribe();
        let Ok(pending) = rx.wait_for(Option::is_some).await.map(|p| p.clone()) else {
            return;
        };
        let Some(PendingConfirmation { options, .. }) = pending else {
            return;
        };

        let confirmed = if assume_yes {
            true
        } else {
            let prompt = format!("{}\n{}", options.title, options.description);
            tokio::task::spawn_blocking(move || {
                Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .unwrap_or(false)
            })
            .await
            .unwrap_or(false)
        };

        if let Err(e) = confirmations.answer(confirmed) {
            debug!(error = %e, "Confirmation already resolved");
        }
    })
}
