use crate::api::FocusApi;
use crate::cache::optimistic::{
    confirm_record, insert_record, patch_record, remove_record, replace_record,
};
use crate::cache::{CacheData, CachedRecord, KeyMatcher, Query, QueryCache, QueryKey, Snapshot};
use crate::error::Result;
use crate::model::{
    EnergyLevel, GtdItem, GtdProject, PomodoroSession, PomodoroSettings, RecordId, SettingsPatch,
    TimeEntry, TimeProject, TwoMinuteTask,
};
use crate::services::Services;
use crate::store::DataStore;
use chrono::{DateTime, Utc};
use std::marker::PhantomData;

/// Values handed to [`Mutation::apply_optimistic`].
#[derive(Debug, Clone)]
pub struct OptimisticContext {
    pub now: DateTime<Utc>,
    /// Id for a record that exists only in the cache until the store answers.
    pub placeholder: RecordId,
}

/// A write, split into the steps the client runs in order:
/// optimistic apply, execute, then reconcile or roll back.
pub trait Mutation {
    type Output;

    /// Completes "Failed to ..." in the rollback toast.
    fn label(&self) -> String;

    /// Keys this mutation may touch. They are cancelled and snapshotted first.
    fn scope(&self) -> Vec<KeyMatcher>;

    fn apply_optimistic(&mut self, cache: &mut QueryCache, ctx: &OptimisticContext);

    fn execute<S: DataStore>(&self, api: &mut FocusApi<S>) -> Result<Self::Output>;

    /// Write the store's answer over the optimistic state.
    fn reconcile(&self, cache: &mut QueryCache, output: &Self::Output, now: DateTime<Utc>);

    fn invalidates(&self) -> Vec<KeyMatcher> {
        self.scope()
    }

    /// Side effects after a successful write. Errors become warning toasts.
    fn on_success(&self, _output: &Self::Output, _services: &Services) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationResult<T> {
    Committed(T),
    RolledBack,
}

impl<T> MutationResult<T> {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationResult::Committed(_))
    }

    pub fn committed(self) -> Option<T> {
        match self {
            MutationResult::Committed(value) => Some(value),
            MutationResult::RolledBack => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MutationResult<U> {
        match self {
            MutationResult::Committed(value) => MutationResult::Committed(f(value)),
            MutationResult::RolledBack => MutationResult::RolledBack,
        }
    }
}

/// A mutation whose optimistic state is applied but whose write has not run.
#[must_use = "a pending mutation must be settled"]
pub struct PendingMutation<M: Mutation> {
    pub(crate) mutation: M,
    pub(crate) snapshot: Snapshot,
}

impl<M: Mutation> PendingMutation<M> {
    pub fn mutation(&self) -> &M {
        &self.mutation
    }
}

pub type SuccessHook<T> = fn(&T, &Services) -> Result<()>;

/// Store calls for one concrete record type.
pub trait RemoteRecord: CachedRecord {
    fn create_via<S: DataStore>(api: &mut FocusApi<S>, draft: Self::Draft) -> Result<Self>;

    fn update_via<S: DataStore>(
        api: &mut FocusApi<S>,
        id: &RecordId,
        patch: Self::Patch,
    ) -> Result<Option<Self>>;

    fn delete_via<S: DataStore>(api: &mut FocusApi<S>, id: &RecordId) -> Result<bool>;
}

macro_rules! remote {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RemoteRecord for $ty {
                fn create_via<S: DataStore>(api: &mut FocusApi<S>, draft: Self::Draft) -> Result<Self> {
                    api.create::<$ty>(draft)
                }

                fn update_via<S: DataStore>(
                    api: &mut FocusApi<S>,
                    id: &RecordId,
                    patch: Self::Patch,
                ) -> Result<Option<Self>> {
                    api.update::<$ty>(id, patch)
                }

                fn delete_via<S: DataStore>(api: &mut FocusApi<S>, id: &RecordId) -> Result<bool> {
                    api.delete::<$ty>(id)
                }
            }
        )*
    };
}

remote!(
    PomodoroSession,
    GtdItem,
    GtdProject,
    EnergyLevel,
    TimeEntry,
    TimeProject,
    TwoMinuteTask,
);

fn default_label<T: CachedRecord>(verb: &str) -> String {
    format!("{verb} {}", T::KIND.label())
}

pub struct CreateRecord<T: RemoteRecord> {
    draft: T::Draft,
    label: String,
    placeholder: Option<RecordId>,
    hook: Option<SuccessHook<T>>,
}

impl<T: RemoteRecord> CreateRecord<T> {
    pub fn new(draft: T::Draft) -> Self {
        Self {
            draft,
            label: default_label::<T>("create"),
            placeholder: None,
            hook: None,
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn on_success(mut self, hook: SuccessHook<T>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Id of the optimistic record, once applied.
    pub fn placeholder(&self) -> Option<&RecordId> {
        self.placeholder.as_ref()
    }

    fn user_id(&self) -> &str {
        T::draft_user(&self.draft)
    }
}

impl<T: RemoteRecord> Mutation for CreateRecord<T> {
    type Output = T;

    fn label(&self) -> String {
        self.label.clone()
    }

    fn scope(&self) -> Vec<KeyMatcher> {
        vec![KeyMatcher::namespace(self.user_id(), T::NAMESPACE)]
    }

    fn apply_optimistic(&mut self, cache: &mut QueryCache, ctx: &OptimisticContext) {
        let record = T::from_draft(ctx.placeholder.clone(), self.draft.clone(), ctx.now);
        insert_record(cache, self.user_id(), &record);
        self.placeholder = Some(ctx.placeholder.clone());
    }

    fn execute<S: DataStore>(&self, api: &mut FocusApi<S>) -> Result<T> {
        T::create_via(api, self.draft.clone())
    }

    fn reconcile(&self, cache: &mut QueryCache, output: &T, _now: DateTime<Utc>) {
        if let Some(placeholder) = &self.placeholder {
            confirm_record(cache, self.user_id(), placeholder, output);
        }
    }

    fn invalidates(&self) -> Vec<KeyMatcher> {
        T::invalidation(self.user_id())
    }

    fn on_success(&self, output: &T, services: &Services) -> Result<()> {
        self.hook.map_or(Ok(()), |hook| hook(output, services))
    }
}

pub struct UpdateRecord<T: RemoteRecord> {
    user_id: String,
    id: RecordId,
    patch: T::Patch,
    label: String,
    hook: Option<SuccessHook<T>>,
}

impl<T: RemoteRecord> UpdateRecord<T> {
    pub fn new(user_id: impl Into<String>, id: RecordId, patch: T::Patch) -> Self {
        Self {
            user_id: user_id.into(),
            id,
            patch,
            label: default_label::<T>("update"),
            hook: None,
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn on_success(mut self, hook: SuccessHook<T>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn patch(&self) -> &T::Patch {
        &self.patch
    }
}

impl<T: RemoteRecord> Mutation for UpdateRecord<T> {
    /// `None` when the store no longer holds the record.
    type Output = Option<T>;

    fn label(&self) -> String {
        self.label.clone()
    }

    fn scope(&self) -> Vec<KeyMatcher> {
        vec![KeyMatcher::namespace(&self.user_id, T::NAMESPACE)]
    }

    fn apply_optimistic(&mut self, cache: &mut QueryCache, ctx: &OptimisticContext) {
        let patched: Option<T> =
            patch_record(cache, &self.user_id, &self.id, self.patch.clone(), ctx.now);
        if patched.is_none() {
            tracing::debug!(id = %self.id, "no cached copy to patch");
        }
    }

    fn execute<S: DataStore>(&self, api: &mut FocusApi<S>) -> Result<Option<T>> {
        T::update_via(api, &self.id, self.patch.clone())
    }

    fn reconcile(&self, cache: &mut QueryCache, output: &Option<T>, _now: DateTime<Utc>) {
        match output {
            Some(record) => {
                replace_record(cache, &self.user_id, record);
            }
            None => {
                remove_record::<T>(cache, &self.user_id, &self.id);
            }
        }
    }

    fn invalidates(&self) -> Vec<KeyMatcher> {
        T::invalidation(&self.user_id)
    }

    fn on_success(&self, output: &Option<T>, services: &Services) -> Result<()> {
        match (self.hook, output) {
            (Some(hook), Some(record)) => hook(record, services),
            _ => Ok(()),
        }
    }
}

pub struct DeleteRecord<T: RemoteRecord> {
    user_id: String,
    id: RecordId,
    label: String,
    record: PhantomData<T>,
}

impl<T: RemoteRecord> DeleteRecord<T> {
    pub fn new(user_id: impl Into<String>, id: RecordId) -> Self {
        Self {
            user_id: user_id.into(),
            id,
            label: default_label::<T>("delete"),
            record: PhantomData,
        }
    }
}

impl<T: RemoteRecord> Mutation for DeleteRecord<T> {
    /// Whether the store still had the record.
    type Output = bool;

    fn label(&self) -> String {
        self.label.clone()
    }

    fn scope(&self) -> Vec<KeyMatcher> {
        vec![KeyMatcher::namespace(&self.user_id, T::NAMESPACE)]
    }

    fn apply_optimistic(&mut self, cache: &mut QueryCache, _ctx: &OptimisticContext) {
        remove_record::<T>(cache, &self.user_id, &self.id);
    }

    fn execute<S: DataStore>(&self, api: &mut FocusApi<S>) -> Result<bool> {
        T::delete_via(api, &self.id)
    }

    fn reconcile(&self, _cache: &mut QueryCache, _output: &bool, _now: DateTime<Utc>) {}

    fn invalidates(&self) -> Vec<KeyMatcher> {
        T::invalidation(&self.user_id)
    }
}

/// Merge a partial patch into the user's settings.
pub struct UpdateSettings {
    key: QueryKey,
    patch: SettingsPatch,
}

impl UpdateSettings {
    pub fn new(user_id: impl Into<String>, patch: SettingsPatch) -> Self {
        Self {
            key: QueryKey::new(user_id, Query::PomodoroSettings),
            patch,
        }
    }
}

impl Mutation for UpdateSettings {
    type Output = PomodoroSettings;

    fn label(&self) -> String {
        "update settings".to_string()
    }

    fn scope(&self) -> Vec<KeyMatcher> {
        vec![KeyMatcher::Exact(self.key.clone())]
    }

    fn apply_optimistic(&mut self, cache: &mut QueryCache, ctx: &OptimisticContext) {
        cache.update_where(&KeyMatcher::Exact(self.key.clone()), |_, data| match data {
            CacheData::Settings(settings) => {
                settings.merge(&self.patch, ctx.now);
                true
            }
            _ => false,
        });
    }

    fn execute<S: DataStore>(&self, api: &mut FocusApi<S>) -> Result<PomodoroSettings> {
        api.update_settings(&self.key.user_id, &self.patch)
    }

    fn reconcile(&self, cache: &mut QueryCache, output: &PomodoroSettings, now: DateTime<Utc>) {
        cache.set_data(&self.key, CacheData::Settings(output.clone()), now);
    }
}
