//! Terminal output for command results.

use serde::Serialize;

use phillet_stores::AuthState;
use phillet_types::{
    short_address, BalanceDisplay, BillingInfo, BlockchainInfoResponse, CreateAddressResponse,
    HealthResponse, Notification, Page, PortfolioAnalytics, RegisterResponse, ResourceKey,
    Script, ScriptExecution, SendTransactionResponse, Session, Template, Timestamp,
    TransactionHistoryResponse, User, WalletAddressesResponse, WalletBalanceResponse,
};
use phillet_utils::format_remaining;

pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce() -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human());
        }
        Ok(())
    }

    pub fn line(&self, message: &str) -> anyhow::Result<()> {
        self.emit(&serde_json::json!({ "message": message }), || message.to_string())
    }

    pub fn logged_in(&self, user: &User) -> anyhow::Result<()> {
        self.emit(user, || format!("Logged in as {} <{}>", user.display_name(), user.email))
    }

    pub fn registered(&self, response: &RegisterResponse) -> anyhow::Result<()> {
        self.emit(response, || {
            if response.message.is_empty() {
                format!("Account {} created, you can now log in", response.user_id)
            } else {
                response.message.clone()
            }
        })
    }

    pub fn status(
        &self,
        state: &AuthState,
        session: Option<&Session>,
        now: Timestamp,
    ) -> anyhow::Result<()> {
        let remaining = session.map(|s| s.expires_at.remaining_from(now));
        let value = serde_json::json!({
            "authenticated": state.is_authenticated,
            "user": state.user,
            "expiresInSecs": remaining.map(|ms| ms / 1000),
        });
        self.emit(&value, || match (&state.user, session) {
            (_, Some(session)) if !session.is_valid_at(now) => {
                "Session expired; the next call will try a silent refresh".to_string()
            }
            (Some(user), Some(_)) => format!(
                "Logged in as {} <{}>, token expires in {}",
                user.display_name(),
                user.email,
                format_remaining(remaining.unwrap_or(0))
            ),
            (None, Some(_)) => format!(
                "Logged in, token expires in {}",
                format_remaining(remaining.unwrap_or(0))
            ),
            (_, None) => "Not logged in".to_string(),
        })
    }

    pub fn balance(
        &self,
        key: &ResourceKey,
        balance: &WalletBalanceResponse,
        display: Option<BalanceDisplay>,
    ) -> anyhow::Result<()> {
        self.emit(balance, || {
            let amount = display
                .map(|d| d.to_string())
                .unwrap_or_else(|| format!("{} (raw) {}", balance.balance, balance.symbol));
            if balance.address.is_empty() {
                format!("{key}: {amount}")
            } else {
                format!("{key}: {amount} at {}", short_address(&balance.address))
            }
        })
    }

    pub fn addresses(&self, list: &WalletAddressesResponse) -> anyhow::Result<()> {
        self.emit(list, || {
            if list.addresses.is_empty() {
                return "No addresses".to_string();
            }
            list.addresses
                .iter()
                .map(|a| {
                    let marker = if a.is_default { "*" } else { " " };
                    let label = a.label.as_deref().unwrap_or("");
                    format!("{marker} {} {} {label}", a.address, a.balance)
                        .trim_end()
                        .to_string()
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    pub fn created_address(&self, created: &CreateAddressResponse) -> anyhow::Result<()> {
        self.emit(created, || {
            format!(
                "Created {} on {}/{}",
                created.address, created.blockchain, created.network
            )
        })
    }

    pub fn submitted(&self, submitted: &SendTransactionResponse) -> anyhow::Result<()> {
        self.emit(submitted, || {
            format!("Submitted {} ({})", submitted.tx_hash, submitted.status.as_str())
        })
    }

    pub fn history(&self, history: &TransactionHistoryResponse) -> anyhow::Result<()> {
        self.emit(history, || {
            let mut lines: Vec<String> = history
                .transactions
                .iter()
                .map(|tx| {
                    format!(
                        "{} {:>10} {} -> {} {}",
                        short_address(&tx.tx_hash),
                        tx.status.as_str(),
                        short_address(&tx.from_address),
                        short_address(&tx.to_address),
                        tx.amount
                    )
                })
                .collect();
            lines.push(format!("{} of {} transactions", history.transactions.len(), history.total));
            lines.join("\n")
        })
    }

    pub fn chain_info(&self, info: &BlockchainInfoResponse) -> anyhow::Result<()> {
        self.emit(info, || {
            format!(
                "{}/{}: block {} gas {} ({})",
                info.blockchain, info.network, info.current_block, info.gas_price, info.status
            )
        })
    }

    pub fn health(&self, health: &HealthResponse) -> anyhow::Result<()> {
        self.emit(health, || {
            let mut lines = vec![format!("gateway {} ({})", health.status, health.version)];
            lines.extend(
                health
                    .services
                    .iter()
                    .map(|(name, status)| format!("  {name}: {status}")),
            );
            lines.join("\n")
        })
    }

    pub fn portfolio(&self, portfolio: &PortfolioAnalytics) -> anyhow::Result<()> {
        self.emit(portfolio, || {
            let mut lines = vec![format!(
                "Total {} (24h {:+.2}%, 7d {:+.2}%, 30d {:+.2}%)",
                portfolio.total_value, portfolio.change_24h, portfolio.change_7d, portfolio.change_30d
            )];
            lines.extend(portfolio.assets.iter().map(|a| {
                format!(
                    "  {:<6} {} (${}, {:.1}%) on {}/{}",
                    a.symbol, a.balance, a.usd_value, a.percentage, a.blockchain, a.network
                )
            }));
            lines.join("\n")
        })
    }

    pub fn notifications(&self, page: &Page<Notification>) -> anyhow::Result<()> {
        self.emit(page, || {
            if page.data.is_empty() {
                return "No notifications".to_string();
            }
            page.data
                .iter()
                .map(|n| {
                    let unread = if n.is_read { " " } else { "•" };
                    format!("{unread} [{}] {}: {}", n.id, n.title, n.message)
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    pub fn billing(&self, info: &BillingInfo) -> anyhow::Result<()> {
        self.emit(info, || {
            let state = if info.is_active { "active" } else { "inactive" };
            let mut lines = vec![format!("Plan {} ({state})", info.plan.as_str())];
            let rows = [
                ("invocations", info.usage.invocations, info.quota.invocations),
                ("storage", info.usage.storage, info.quota.storage),
                ("compute", info.usage.compute, info.quota.compute),
            ];
            lines.extend(
                rows.iter()
                    .map(|(name, used, limit)| format!("  {name:<12} {used}/{limit}")),
            );
            let exhausted = info.exhausted();
            if !exhausted.is_empty() {
                lines.push(format!("Quota reached: {}", exhausted.join(", ")));
            }
            lines.join("\n")
        })
    }

    pub fn templates(&self, page: &Page<Template>) -> anyhow::Result<()> {
        self.emit(page, || {
            if page.data.is_empty() {
                return "No templates".to_string();
            }
            let mut lines: Vec<String> = page
                .data
                .iter()
                .map(|t| {
                    let verified = if t.is_verified { "✓" } else { " " };
                    format!(
                        "{verified} {} {} [{}] {:.1}★ {} installs",
                        t.id, t.name, t.category, t.rating, t.downloads
                    )
                })
                .collect();
            if page.has_more {
                lines.push(format!("page {} of {} results, more available", page.page, page.total));
            }
            lines.join("\n")
        })
    }

    pub fn template(&self, template: &Template) -> anyhow::Result<()> {
        self.emit(template, || {
            format!(
                "{} v{} by {}\n{}\n\n{}",
                template.name, template.version, template.author, template.description, template.code
            )
        })
    }

    pub fn script(&self, script: &Script) -> anyhow::Result<()> {
        self.emit(script, || script_line(script))
    }

    pub fn scripts(&self, scripts: &[Script]) -> anyhow::Result<()> {
        self.emit(&scripts, || {
            if scripts.is_empty() {
                return "No scripts".to_string();
            }
            scripts.iter().map(script_line).collect::<Vec<_>>().join("\n")
        })
    }

    pub fn execution(&self, run: &ScriptExecution) -> anyhow::Result<()> {
        self.emit(run, || match &run.error {
            Some(error) => format!("Run {} of {} failed: {error}", run.id, run.script_id),
            None => format!("Run {} of {}: {}", run.id, run.script_id, run.status.as_str()),
        })
    }
}

fn script_line(script: &Script) -> String {
    let state = if script.is_active { "on " } else { "off" };
    format!(
        "{state} {} {} ({} runs)",
        script.id, script.name, script.execution_count
    )
}
