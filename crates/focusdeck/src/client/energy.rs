use super::{CreateRecord, DeleteRecord, FocusClient, MutationResult, UpdateRecord};
use crate::cache::{CacheData, Query, QueryKey};
use crate::insights::EnergyInsights;
use crate::model::{EnergyLevel, EnergyLevelDraft, EnergyLevelPatch, RecordId};
use crate::store::DataStore;

impl<S: DataStore> FocusClient<S> {
    pub fn log_energy(&mut self, draft: EnergyLevelDraft) -> MutationResult<EnergyLevel> {
        self.mutate(CreateRecord::<EnergyLevel>::new(draft).labelled("log energy"))
    }

    pub fn update_energy(
        &mut self,
        user_id: &str,
        id: RecordId,
        patch: EnergyLevelPatch,
    ) -> MutationResult<Option<EnergyLevel>> {
        self.mutate(UpdateRecord::<EnergyLevel>::new(user_id, id, patch))
    }

    pub fn delete_energy(&mut self, user_id: &str, id: RecordId) -> MutationResult<bool> {
        self.mutate(DeleteRecord::<EnergyLevel>::new(user_id, id))
    }

    pub fn energy_insights(&mut self, user_id: &str) -> Option<EnergyInsights> {
        match self.query(&QueryKey::new(user_id, Query::EnergyInsights)).data {
            Some(CacheData::EnergyInsights(insights)) => Some(insights),
            _ => None,
        }
    }
}
