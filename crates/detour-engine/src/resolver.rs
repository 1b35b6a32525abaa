use crate::adapter::{annotate, RedirectStoreAdapter};
use crate::path::{load_settings, PathMapper};
use crate::Result;
use detour_core::{
    ContentTypeUid, NewRedirect, Redirect, RedirectId, RedirectPatch, RedirectStore,
    SettingsSource,
};
use std::sync::Arc;
use tracing::{debug, info};

/// A slug transition of one entity, already mapped to paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugChange {
    pub display_name: String,
    pub old_slug: String,
    pub new_slug: String,
    pub old_path: String,
    pub new_path: String,
}

impl SlugChange {
    fn created_note(&self) -> String {
        format!(
            "Auto-generated: {} slug changed from \"{}\" to \"{}\"",
            self.display_name, self.old_slug, self.new_slug
        )
    }

    fn chain_note(&self) -> String {
        format!(
            "Chain resolved: {} slug changed to \"{}\"",
            self.display_name, self.new_slug
        )
    }

    fn loop_note(&self) -> String {
        format!(
            "Deactivated: {} slug change to \"{}\" would close a loop",
            self.display_name, self.new_slug
        )
    }

    fn reversed_note(&self) -> String {
        format!(
            "Updated direction: {} slug changed from \"{}\" to \"{}\"",
            self.display_name, self.old_slug, self.new_slug
        )
    }
}

/// The active redirects around the two paths of a [`SlugChange`].
#[derive(Debug, Clone, Default)]
pub struct Neighborhood {
    /// Active redirects leaving the old path.
    pub from_old: Vec<Redirect>,
    /// Active redirects landing on the old path.
    pub into_old: Vec<Redirect>,
    /// Active redirects leaving the new path.
    pub from_new: Vec<Redirect>,
}

/// Patches a redirect that pointed at the old path.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRewrite {
    pub redirect: Redirect,
    pub patch: RedirectPatch,
}

/// What happens to the `old -> new` edge itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The slug did not change.
    Unchanged,
    /// The old path is already redirected somewhere.
    AlreadyRedirected(RedirectId),
    /// Both slugs map to the same path; only chains are touched.
    SamePath,
    /// Flip the existing `new -> old` redirect in place.
    Reverse {
        redirect: Redirect,
        patch: RedirectPatch,
    },
    /// Insert a fresh `old -> new` redirect.
    Create(NewRedirect),
}

/// The writes a slug change requires, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub rewrites: Vec<ChainRewrite>,
    /// `X -> old` redirects switched off because `new -> X` is active.
    /// Retargeting them would form `X -> new -> X`, and keeping them would
    /// close `old -> new -> X -> old`.
    pub retired: Vec<ChainRewrite>,
    /// `new -> old` redirects left to the decision step.
    pub skipped: Vec<RedirectId>,
    pub decision: Decision,
}

impl Plan {
    fn only(decision: Decision) -> Self {
        Self {
            rewrites: Vec::new(),
            retired: Vec::new(),
            skipped: Vec::new(),
            decision,
        }
    }

    /// Returns `true` if executing the plan touches the store.
    pub fn has_writes(&self) -> bool {
        !self.rewrites.is_empty()
            || !self.retired.is_empty()
            || matches!(self.decision, Decision::Reverse { .. } | Decision::Create(_))
    }
}

/// Decides how a slug change is reflected in the redirect graph.
///
/// Branches are evaluated in order and the first that applies wins:
///
/// 1. unchanged slug: nothing to do;
/// 2. an active redirect already leaves the old path: nothing to do;
/// 3. every active `X -> old` is retargeted to `X -> new`. `new -> old` is
///    left for step 5. When `new -> X` is active, `X -> old` is deactivated
///    instead, since either keeping or retargeting it would loop;
/// 4. old and new path coincide: stop after step 3;
/// 5. an active `new -> old` exists: flip it to `old -> new`;
/// 6. otherwise create `old -> new`.
pub fn plan(change: &SlugChange, neighborhood: &Neighborhood) -> Plan {
    if change.old_slug == change.new_slug {
        return Plan::only(Decision::Unchanged);
    }
    if let Some(existing) = neighborhood.from_old.first() {
        return Plan::only(Decision::AlreadyRedirected(existing.id));
    }

    let mut rewrites = Vec::new();
    let mut retired = Vec::new();
    let mut skipped = Vec::new();
    for redirect in &neighborhood.into_old {
        if redirect.from_path == change.new_path {
            skipped.push(redirect.id);
            continue;
        }
        let closes_loop = neighborhood
            .from_new
            .iter()
            .any(|r| r.to_path == redirect.from_path);
        if closes_loop {
            retired.push(ChainRewrite {
                redirect: redirect.clone(),
                patch: RedirectPatch {
                    is_active: Some(false),
                    description: Some(annotate(&redirect.description, &change.loop_note())),
                    ..Default::default()
                },
            });
            continue;
        }
        rewrites.push(ChainRewrite {
            redirect: redirect.clone(),
            patch: RedirectPatch {
                to_path: Some(change.new_path.clone()),
                description: Some(annotate(&redirect.description, &change.chain_note())),
                ..Default::default()
            },
        });
    }

    let decision = if change.old_path == change.new_path {
        Decision::SamePath
    } else if let Some(back) = neighborhood
        .from_new
        .iter()
        .find(|r| r.to_path == change.old_path)
    {
        Decision::Reverse {
            redirect: back.clone(),
            patch: RedirectPatch {
                from_path: Some(change.old_path.clone()),
                to_path: Some(change.new_path.clone()),
                description: Some(annotate(&back.description, &change.reversed_note())),
                ..Default::default()
            },
        }
    } else {
        Decision::Create(
            NewRedirect::permanent(change.old_path.clone(), change.new_path.clone())
                .with_description(change.created_note()),
        )
    };

    Plan {
        rewrites,
        retired,
        skipped,
        decision,
    }
}

/// What [`Resolver::reconcile`] did.
///
/// `rewired` holds every redirect that pointed at the old path and was
/// retargeted or deactivated.
#[derive(Debug, Clone, PartialEq)]
pub enum RedirectOutcome {
    Unchanged,
    AlreadyRedirected {
        existing: RedirectId,
    },
    SamePath {
        rewired: Vec<Redirect>,
    },
    Reversed {
        redirect: Redirect,
        rewired: Vec<Redirect>,
    },
    Created {
        redirect: Redirect,
        rewired: Vec<Redirect>,
    },
}

/// Keeps the redirect graph consistent with slug changes.
pub struct Resolver<S, G> {
    adapter: RedirectStoreAdapter<S>,
    settings: Arc<G>,
    mapper: PathMapper,
}

impl<S: RedirectStore, G: SettingsSource> Resolver<S, G> {
    pub fn new(adapter: RedirectStoreAdapter<S>, settings: Arc<G>, mapper: PathMapper) -> Self {
        Self {
            adapter,
            settings,
            mapper,
        }
    }

    /// Reflects `old_slug -> new_slug` of an entity of type `uid` in the store.
    ///
    /// An unchanged slug returns before any store access.
    pub async fn reconcile(
        &self,
        uid: &ContentTypeUid,
        old_slug: &str,
        new_slug: &str,
    ) -> Result<RedirectOutcome> {
        if old_slug == new_slug {
            return Ok(RedirectOutcome::Unchanged);
        }

        let settings = load_settings(self.settings.as_ref()).await;
        let change = SlugChange {
            display_name: self.mapper.display_name(uid).to_string(),
            old_slug: old_slug.to_string(),
            new_slug: new_slug.to_string(),
            old_path: self.mapper.map_path(&settings, uid, old_slug)?,
            new_path: self.mapper.map_path(&settings, uid, new_slug)?,
        };

        let neighborhood = self.survey(&change).await?;
        let plan = plan(&change, &neighborhood);
        self.execute(&change, plan).await
    }

    async fn survey(&self, change: &SlugChange) -> Result<Neighborhood> {
        let from_old = self.adapter.find_active_from(&change.old_path).await?;
        if !from_old.is_empty() {
            return Ok(Neighborhood {
                from_old,
                ..Default::default()
            });
        }
        Ok(Neighborhood {
            from_old,
            into_old: self.adapter.find_active_to(&change.old_path).await?,
            from_new: self.adapter.find_active_from(&change.new_path).await?,
        })
    }

    async fn execute(&self, change: &SlugChange, plan: Plan) -> Result<RedirectOutcome> {
        for id in &plan.skipped {
            debug!(
                id = %id,
                new_path = %change.new_path,
                "left reverse redirect to the direction check"
            );
        }

        let mut rewired = Vec::with_capacity(plan.rewrites.len() + plan.retired.len());
        for rewrite in plan.rewrites {
            rewired.push(self.adapter.update(&rewrite.redirect, rewrite.patch).await?);
        }
        for retire in plan.retired {
            info!(
                id = %retire.redirect.id,
                from_path = %retire.redirect.from_path,
                new_path = %change.new_path,
                "deactivating redirect that would close a loop"
            );
            rewired.push(self.adapter.update(&retire.redirect, retire.patch).await?);
        }

        match plan.decision {
            Decision::Unchanged => Ok(RedirectOutcome::Unchanged),
            Decision::AlreadyRedirected(existing) => {
                debug!(
                    id = %existing,
                    old_path = %change.old_path,
                    "old path already redirected"
                );
                Ok(RedirectOutcome::AlreadyRedirected { existing })
            }
            Decision::SamePath => {
                debug!(path = %change.new_path, "slug change maps to the same path");
                Ok(RedirectOutcome::SamePath { rewired })
            }
            Decision::Reverse { redirect, patch } => {
                let redirect = self.adapter.update(&redirect, patch).await?;
                Ok(RedirectOutcome::Reversed { redirect, rewired })
            }
            Decision::Create(data) => {
                let redirect = self.adapter.create(data).await?;
                Ok(RedirectOutcome::Created { redirect, rewired })
            }
        }
    }
}
