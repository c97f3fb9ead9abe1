use crate::config::{AutoSaveSettings, SettingsPort};
use anyhow::Result;
use uuid::Uuid;

/// Returns the persisted owner id, generating and storing one on first use. Stable across
/// runs so one installation keeps writing into the same backup subfolder.
pub fn ensure_owner_id<P: SettingsPort + ?Sized>(settings: &mut AutoSaveSettings, port: &mut P) -> Result<String> {
    if let Some(existing) = settings.owner_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        return Ok(existing.to_string());
    }
    let generated = Uuid::new_v4().to_string();
    settings.owner_id = Some(generated.clone());
    port.store(settings)?;
    Ok(generated)
}
