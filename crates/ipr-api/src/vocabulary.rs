//! # Vocabulary Registry
//!
//! The controlled dropdown options for the four categorical entry fields.
//!
//! Seeded system options define each category's defaults. Users may add
//! custom options at runtime; admins may edit, deactivate, or (custom
//! only) delete them. `(category, value)` is unique: every mutation takes
//! the registry's mutation lock before checking for a collision, and the
//! Postgres table carries a unique index as a second line.
//!
//! ## Merge rule
//!
//! At hydration, a stored system option replaces the in-memory seed record
//! of the same value (keeping its id and active flag). A stored custom
//! option is kept only if its value does not collide with a system value
//! or an already-loaded option.

use std::sync::Arc;

use chrono::Utc;
use ipr_core::{
    policy, seed, Actor, Category, DropdownOption, IprError, OptionPatch, ValidationError,
};
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::events::{ChangeBus, ChangeEvent};
use crate::state::Store;

/// Cloneable handle to the shared vocabulary.
#[derive(Clone)]
pub struct VocabularyRegistry {
    options: Store<DropdownOption>,
    db_pool: Option<PgPool>,
    bus: ChangeBus,
    mutation: Arc<Mutex<()>>,
}

impl VocabularyRegistry {
    pub fn new(db_pool: Option<PgPool>, bus: ChangeBus) -> Self {
        Self {
            options: Store::new(),
            db_pool,
            bus,
            mutation: Arc::new(Mutex::new(())),
        }
    }

    // ── Seeding & hydration ─────────────────────────────────────────────

    /// Add every system option that is not already present. Idempotent.
    pub fn seed(&self) -> usize {
        let now = Utc::now();
        let mut added = 0;
        for sys in seed::SYSTEM_OPTIONS {
            if self.find(sys.category, sys.value).is_some() {
                continue;
            }
            let option = DropdownOption {
                id: Uuid::new_v4(),
                category: sys.category,
                value: sys.value.to_string(),
                display_name: sys.display_name.to_string(),
                is_custom: false,
                is_active: true,
                created_by: seed::SYSTEM_ACTOR.to_string(),
                created_at: now,
            };
            self.options.insert(option.id, option);
            added += 1;
        }
        added
    }

    /// Write the in-memory system options to Postgres unless already
    /// stored. Returns the number of rows written.
    pub async fn persist_seed(&self) -> Result<usize, IprError> {
        let Some(pool) = &self.db_pool else {
            return Ok(0);
        };
        let mut written = 0;
        for option in self.options.filter(DropdownOption::is_system) {
            if crate::db::options::insert_if_absent(pool, &option)
                .await
                .map_err(crate::db::store_error)?
            {
                written += 1;
            }
        }
        Ok(written)
    }

    /// Merge stored options into the registry. Returns how many were kept.
    pub fn hydrate(&self, stored: Vec<DropdownOption>) -> usize {
        let mut kept = 0;
        for option in stored {
            let existing = self.find(option.category, &option.value);
            if seed::is_system_value(option.category, &option.value) {
                if option.is_custom {
                    tracing::warn!(
                        category = %option.category,
                        value = %option.value,
                        "dropping stored custom option that shadows a system value"
                    );
                    continue;
                }
                if let Some(seeded) = existing {
                    self.options.remove(&seeded.id);
                }
            } else if existing.is_some() {
                tracing::warn!(
                    category = %option.category,
                    value = %option.value,
                    "dropping duplicate stored option"
                );
                continue;
            }
            self.options.insert(option.id, option);
            kept += 1;
        }
        kept
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Number of options, active or not.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// The option holding `value` in `category`, compared case-insensitively.
    pub fn find(&self, category: Category, value: &str) -> Option<DropdownOption> {
        let value = value.trim();
        self.options
            .find(|o| o.category == category && o.value.eq_ignore_ascii_case(value))
    }

    /// Option by id.
    pub fn get(&self, id: Uuid) -> Result<DropdownOption, IprError> {
        self.options
            .get(&id)
            .ok_or_else(|| IprError::option_not_found(id))
    }

    /// Display name for a value, or the value itself when unmapped.
    pub fn lookup_display_name(&self, category: Category, value: &str) -> String {
        self.find(category, value)
            .map(|o| o.display_name)
            .unwrap_or_else(|| value.to_string())
    }

    /// Active options of a category, sorted by display name.
    pub fn options_for(&self, category: Category) -> Vec<DropdownOption> {
        let mut options = self
            .options
            .filter(|o| o.category == category && o.is_active);
        options.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        options
    }

    /// Admin listing, optionally narrowed to one category.
    pub fn list_all(&self, category: Option<Category>, include_inactive: bool) -> Vec<DropdownOption> {
        let mut options = self.options.filter(|o| {
            category.map_or(true, |c| o.category == c) && (include_inactive || o.is_active)
        });
        options.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        options
    }

    /// Active option count per category.
    pub fn counts_by_category(&self) -> Vec<(Category, usize)> {
        let active = self.options.filter(|o| o.is_active);
        Category::ALL
            .into_iter()
            .map(|c| (c, active.iter().filter(|o| o.category == c).count()))
            .collect()
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Register a user-supplied value.
    ///
    /// The value is normalised (trimmed, upper-cased) and checked against
    /// the field-length policy. Fails with [`IprError::DuplicateOption`] if
    /// the category already holds it, in any case.
    pub async fn add_custom_option(
        &self,
        category: Category,
        value: &str,
        display_name: Option<&str>,
        actor: &Actor,
    ) -> Result<DropdownOption, IprError> {
        let value = policy::normalize_value(value);
        policy::check_value(category, &value)
            .map_err(|reason| ValidationError::single(category.field(), reason))?;
        let display_name = display_name
            .map(policy::sanitize)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| value.clone());

        let guard = self.mutation.lock().await;
        if self.find(category, &value).is_some() {
            return Err(IprError::DuplicateOption { category, value });
        }

        let option = DropdownOption {
            id: Uuid::new_v4(),
            category,
            value,
            display_name,
            is_custom: true,
            is_active: true,
            created_by: actor.id.clone(),
            created_at: Utc::now(),
        };

        if let Some(pool) = &self.db_pool {
            crate::db::options::insert(pool, &option)
                .await
                .map_err(|e| write_error(e, &option))?;
        }
        self.options.insert(option.id, option.clone());
        drop(guard);

        tracing::info!(
            category = %option.category,
            value = %option.value,
            actor = %actor.id,
            "custom option added"
        );
        self.bus.publish(ChangeEvent::OptionAdded {
            option: option.clone(),
        });
        Ok(option)
    }

    /// Admin edit of value, label, or active flag.
    ///
    /// A new value is normalised and must not collide with another option
    /// of the same category. System option values cannot be renamed.
    pub async fn update_option(
        &self,
        id: Uuid,
        patch: OptionPatch,
        actor: &Actor,
    ) -> Result<DropdownOption, IprError> {
        actor.require_admin("update option")?;

        let guard = self.mutation.lock().await;
        let current = self.get(id)?;
        let mut updated = current.clone();

        if let Some(raw) = &patch.value {
            let value = policy::normalize_value(raw);
            if value != current.value {
                if current.is_system() {
                    return Err(ValidationError::single(
                        current.category.field(),
                        "system option values cannot be renamed",
                    )
                    .into());
                }
                policy::check_value(current.category, &value)
                    .map_err(|reason| ValidationError::single(current.category.field(), reason))?;
                if let Some(other) = self.find(current.category, &value) {
                    if other.id != id {
                        return Err(IprError::DuplicateOption {
                            category: current.category,
                            value,
                        });
                    }
                }
                updated.value = value;
            }
        }
        if let Some(label) = patch.display_name.as_deref().map(policy::sanitize) {
            if !label.is_empty() {
                updated.display_name = label;
            }
        }
        if let Some(active) = patch.is_active {
            updated.is_active = active;
        }

        if updated == current {
            return Ok(current);
        }

        if let Some(pool) = &self.db_pool {
            let found = crate::db::options::update(pool, &updated)
                .await
                .map_err(|e| write_error(e, &updated))?;
            crate::db::require_row(found, "dropdown_options", id)?;
        }
        self.options.insert(id, updated.clone());
        drop(guard);

        tracing::info!(
            option_id = %id,
            category = %updated.category,
            value = %updated.value,
            is_active = updated.is_active,
            actor = %actor.id,
            "option updated"
        );
        self.bus.publish(ChangeEvent::OptionUpdated {
            option: updated.clone(),
        });
        Ok(updated)
    }

    /// Hide an option from pickers and validation. Works for system options.
    pub async fn deactivate(&self, id: Uuid, actor: &Actor) -> Result<DropdownOption, IprError> {
        let patch = OptionPatch {
            is_active: Some(false),
            ..Default::default()
        };
        self.update_option(id, patch, actor).await
    }

    /// Hard-delete a custom option. System options fail with
    /// [`IprError::ForbiddenDelete`].
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<DropdownOption, IprError> {
        actor.require_admin("delete option")?;

        let guard = self.mutation.lock().await;
        let option = self.get(id)?;
        if option.is_system() {
            return Err(IprError::ForbiddenDelete {
                category: option.category,
                value: option.value,
            });
        }

        if let Some(pool) = &self.db_pool {
            let found = crate::db::options::delete(pool, id)
                .await
                .map_err(crate::db::store_error)?;
            crate::db::require_row(found, "dropdown_options", id)?;
        }
        self.options.remove(&id);
        drop(guard);

        tracing::info!(
            option_id = %id,
            category = %option.category,
            value = %option.value,
            actor = %actor.id,
            "custom option deleted"
        );
        self.bus.publish(ChangeEvent::OptionRemoved {
            id,
            category: option.category,
            value: option.value.clone(),
        });
        Ok(option)
    }
}

impl ipr_state::Vocabulary for VocabularyRegistry {
    fn is_active(&self, category: Category, value: &str) -> bool {
        self.find(category, value).is_some_and(|o| o.is_active)
    }
}

/// A unique-index violation is a duplicate that raced past the in-process
/// check on another instance.
fn write_error(err: sqlx::Error, option: &DropdownOption) -> IprError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => IprError::DuplicateOption {
            category: option.category,
            value: option.value.clone(),
        },
        _ => crate::db::store_error(err),
    }
}
