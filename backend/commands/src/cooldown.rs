//! Command cooldowns: per-scope usage counters with self-expiring entries.
//!
//! Every admitted use increments the scope's counter and schedules a timer
//! that decrements it after `usage_expires`. A scope is rejected while its
//! counter is at `max_runs`.

use async_trait::async_trait;
use herald_core::Snowflake;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::context::Context;

// ---------------------------------------------------------------------------
// Cooldown trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Cooldown: Send + Sync {
    /// Allocate internal state. Must be idempotent: one cooldown can be
    /// attached to a command, a category and the router at the same time.
    fn init(&self);

    /// Count one use for the invoking scope. `Err` carries the message shown
    /// to the user when the scope is cooling down.
    async fn check(&self, ctx: &Context) -> Result<(), String>;

    /// Forget every recorded use.
    async fn clear(&self);
}

/// Pointer identity of two cooldown handles.
pub(crate) fn same_cooldown(a: &Arc<dyn Cooldown>, b: &Arc<dyn Cooldown>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

// ---------------------------------------------------------------------------
// Scopes
// ---------------------------------------------------------------------------

/// Picks the identifier a cooldown counts uses against.
pub trait CooldownScope: Send + Sync + 'static {
    const NAME: &'static str;

    fn scope_id(ctx: &Context) -> Snowflake;
}

pub struct PerUser;

impl CooldownScope for PerUser {
    const NAME: &'static str = "user";

    fn scope_id(ctx: &Context) -> Snowflake {
        ctx.message.author.id
    }
}

pub struct PerChannel;

impl CooldownScope for PerChannel {
    const NAME: &'static str = "channel";

    fn scope_id(ctx: &Context) -> Snowflake {
        ctx.message.channel_id
    }
}

/// Direct messages share the zero id.
pub struct PerGuild;

impl CooldownScope for PerGuild {
    const NAME: &'static str = "guild";

    fn scope_id(ctx: &Context) -> Snowflake {
        ctx.message.guild_id.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Scoped cooldown
// ---------------------------------------------------------------------------

#[derive(Default)]
struct UsageTable {
    /// Bumped by `clear`; timers from an older generation do nothing.
    generation: u64,
    counts: HashMap<Snowflake, u32>,
}

pub struct ScopedCooldown<S> {
    max_runs: u32,
    usage_expires: Duration,
    table: OnceLock<Arc<Mutex<UsageTable>>>,
    _scope: PhantomData<fn() -> S>,
}

pub type UserCooldown = ScopedCooldown<PerUser>;
pub type ChannelCooldown = ScopedCooldown<PerChannel>;
pub type GuildCooldown = ScopedCooldown<PerGuild>;

impl<S: CooldownScope> ScopedCooldown<S> {
    pub fn new(max_runs: u32, usage_expires: Duration) -> Self {
        Self {
            max_runs,
            usage_expires,
            table: OnceLock::new(),
            _scope: PhantomData,
        }
    }

    pub fn max_runs(&self) -> u32 {
        self.max_runs
    }

    pub fn usage_expires(&self) -> Duration {
        self.usage_expires
    }

    /// Live uses recorded for `id`.
    pub async fn current_usage(&self, id: Snowflake) -> u32 {
        self.table().lock().await.counts.get(&id).copied().unwrap_or(0)
    }

    fn table(&self) -> &Arc<Mutex<UsageTable>> {
        self.table.get_or_init(|| Arc::new(Mutex::new(UsageTable::default())))
    }

    fn schedule_expiry(&self, id: Snowflake, generation: u64) {
        let table = Arc::clone(self.table());
        let expires = self.usage_expires;
        tokio::spawn(async move {
            tokio::time::sleep(expires).await;
            let mut table = table.lock().await;
            if table.generation != generation {
                return;
            }
            if let Entry::Occupied(mut entry) = table.counts.entry(id) {
                let remaining = entry.get().saturating_sub(1);
                if remaining == 0 {
                    entry.remove();
                } else {
                    *entry.get_mut() = remaining;
                }
            }
        });
    }
}

#[async_trait]
impl<S: CooldownScope> Cooldown for ScopedCooldown<S> {
    fn init(&self) {
        self.table();
    }

    async fn check(&self, ctx: &Context) -> Result<(), String> {
        let id = S::scope_id(ctx);
        let mut table = self.table().lock().await;

        let usages = table.counts.get(&id).copied().unwrap_or(0);
        if usages >= self.max_runs {
            debug!(scope = S::NAME, id = %id, usages, "Cooldown rejected");
            return Err(format!(
                "This command has a {} cooldown.",
                format_duration(self.usage_expires)
            ));
        }

        table.counts.insert(id, usages + 1);
        let generation = table.generation;
        drop(table);

        self.schedule_expiry(id, generation);
        Ok(())
    }

    async fn clear(&self) {
        let mut table = self.table().lock().await;
        table.generation += 1;
        table.counts = HashMap::new();
    }
}

// ---------------------------------------------------------------------------
// Composite
// ---------------------------------------------------------------------------

/// Admits only when every inner cooldown admits, checked in order.
///
/// Inner cooldowns that already counted a use are not rolled back when a
/// later one rejects.
pub struct MultipleCooldowns {
    cooldowns: Vec<Arc<dyn Cooldown>>,
}

pub fn multiple_cooldowns(cooldowns: Vec<Arc<dyn Cooldown>>) -> MultipleCooldowns {
    MultipleCooldowns { cooldowns }
}

#[async_trait]
impl Cooldown for MultipleCooldowns {
    fn init(&self) {
        for cooldown in &self.cooldowns {
            cooldown.init();
        }
    }

    async fn check(&self, ctx: &Context) -> Result<(), String> {
        for cooldown in &self.cooldowns {
            cooldown.check(ctx).await?;
        }
        Ok(())
    }

    async fn clear(&self) {
        for cooldown in &self.cooldowns {
            cooldown.clear().await;
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Human duration such as `1 second` or `2 minutes 30 seconds`.
pub fn format_duration(duration: Duration) -> String {
    const UNITS: [(&str, u64); 5] = [
        ("week", 7 * 24 * 3600),
        ("day", 24 * 3600),
        ("hour", 3600),
        ("minute", 60),
        ("second", 1),
    ];

    let mut secs = duration.as_secs();
    let mut parts = Vec::new();
    for (unit, size) in UNITS {
        let amount = secs / size;
        secs %= size;
        if amount > 0 {
            parts.push(plural(amount, unit));
        }
    }

    let millis = u64::from(duration.subsec_millis());
    if millis > 0 {
        parts.push(plural(millis, "millisecond"));
    }

    if parts.is_empty() {
        return "0 seconds".to_string();
    }
    parts.join(" ")
}

fn plural(amount: u64, unit: &str) -> String {
    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{mock_context, mock_message};

    fn user_ctx(user_id: u64) -> Context {
        let mut message = mock_message("%cmd");
        message.author.id = Snowflake::new(user_id);
        mock_context(message)
    }

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_max_then_expires() {
        let cooldown = UserCooldown::new(2, Duration::from_secs(1));
        cooldown.init();
        let ctx = user_ctx(100);

        assert!(cooldown.check(&ctx).await.is_ok());
        assert!(cooldown.check(&ctx).await.is_ok());
        let rejected = cooldown.check(&ctx).await.unwrap_err();
        assert_eq!(rejected, "This command has a 1 second cooldown.");

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert_eq!(cooldown.current_usage(Snowflake::new(100)).await, 0);
        assert!(cooldown.check(&ctx).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn scopes_are_independent() {
        let cooldown = UserCooldown::new(1, Duration::from_secs(5));
        assert!(cooldown.check(&user_ctx(1)).await.is_ok());
        assert!(cooldown.check(&user_ctx(2)).await.is_ok());
        assert!(cooldown.check(&user_ctx(1)).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn channel_and_guild_scopes_read_message() {
        let channel = ChannelCooldown::new(1, Duration::from_secs(5));
        let guild = GuildCooldown::new(1, Duration::from_secs(5));

        let a = user_ctx(1);
        let b = user_ctx(2);
        assert!(channel.check(&a).await.is_ok());
        assert!(channel.check(&b).await.is_err());
        assert!(guild.check(&a).await.is_ok());
        assert!(guild.check(&b).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_detaches_pending_timers() {
        let cooldown = UserCooldown::new(1, Duration::from_secs(1));
        let ctx = user_ctx(7);
        assert!(cooldown.check(&ctx).await.is_ok());

        cooldown.clear().await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(cooldown.check(&ctx).await.is_ok());

        // The timer from before the clear must not release the new use early.
        tokio::time::sleep(Duration::from_millis(501)).await;
        assert_eq!(cooldown.current_usage(Snowflake::new(7)).await, 1);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(cooldown.current_usage(Snowflake::new(7)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn composite_does_not_roll_back() {
        let first = Arc::new(UserCooldown::new(5, Duration::from_secs(10)));
        let second = Arc::new(UserCooldown::new(0, Duration::from_secs(10)));
        let chain = multiple_cooldowns(vec![first.clone(), second]);
        chain.init();

        let ctx = user_ctx(3);
        assert!(chain.check(&ctx).await.is_err());
        assert_eq!(first.current_usage(Snowflake::new(3)).await, 1);
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::from_secs(1)), "1 second");
        assert_eq!(format_duration(Duration::from_secs(150)), "2 minutes 30 seconds");
        assert_eq!(format_duration(Duration::from_secs(3600 * 25)), "1 day 1 hour");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1 second 500 milliseconds");
        assert_eq!(format_duration(Duration::ZERO), "0 seconds");
    }

    #[test]
    fn identity_is_by_pointer() {
        let a: Arc<dyn Cooldown> = Arc::new(UserCooldown::new(1, Duration::from_secs(1)));
        let b: Arc<dyn Cooldown> = Arc::new(UserCooldown::new(1, Duration::from_secs(1)));
        assert!(same_cooldown(&a, &a.clone()));
        assert!(!same_cooldown(&a, &b));
    }
}
