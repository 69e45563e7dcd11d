//! Physics world management with Rapier3D.
//!
//! One [`PhysicsWorld`] owns the Rapier sets and pipelines shared by static geometry and the
//! tick-scoped dynamic bodies, along with the frame's collision event buffer.

use crate::classifier::{classify, ContactClassifier, OwnerInfo, OwnerTable, PairClass};
use crate::collision::{ColliderTag, CollisionEvent, EventBuffer};
use crate::config::PhysicsConfig;
use crate::dynamic::DynamicBody;
use crate::error::PhysicsError;
use crate::static_store::StaticGeometryStore;
use crate::terrain_probe::probe_box;
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::parry::query;
use rapier3d::parry::shape::Cuboid;
use rapier3d::prelude::*;
use scene::{Pose, Quat, Reference, SceneProvider, SubstepPlan, Vec3, MIN_FRAME_MILLIS};
use std::collections::HashSet;

pub fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

pub fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn to_rotation(q: Quat) -> Rotation<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

pub fn from_rotation(q: &Rotation<Real>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

pub fn to_isometry(pose: Pose) -> Isometry<Real> {
    Isometry::from_parts(Translation::from(to_vector(pose.position)), to_rotation(pose.rotation))
}

pub fn from_isometry(iso: &Isometry<Real>) -> Pose {
    Pose::new(from_vector(&iso.translation.vector), from_rotation(&iso.rotation))
}

/// Outcome of one [`PhysicsWorld::step_simulation`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub substeps: u32,
    pub substep_seconds: f32,
    /// Bodies simulated this tick.
    pub dynamic_bodies: usize,
    /// Probe boxes that touched their body, summed over sub-steps.
    pub terrain_contacts: usize,
    /// Skybox of the terrain the local avatar touched, if any.
    pub skybox_reference: Option<String>,
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
    pub config: PhysicsConfig,
    pub static_store: StaticGeometryStore,
    events: EventBuffer,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: to_vector(config.gravity()),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            events: EventBuffer::new(config.event_capacity),
            static_store: StaticGeometryStore::new(),
            config,
        }
    }

    /// Clear the event buffer and start recording collision pairs.
    pub fn begin_frame(&mut self) {
        self.events.begin_frame();
    }

    /// Take the pairs recorded since [`PhysicsWorld::begin_frame`] and stop recording.
    pub fn drain_events(&mut self) -> Vec<CollisionEvent> {
        self.events.drain()
    }

    /// Advance the simulation by `elapsed_ms`.
    ///
    /// Physics-enabled top-level objects become rigid bodies for the duration of the call; their
    /// simulated state is written back into `scene` before the bodies are removed. Per-pair and
    /// per-body failures are logged and skipped, so the tick always completes.
    pub fn step_simulation<S: SceneProvider + ?Sized>(
        &mut self,
        scene: &mut S,
        elapsed_ms: u32,
        local_avatar: Option<Reference>,
    ) -> StepReport {
        let elapsed_ms = if elapsed_ms < MIN_FRAME_MILLIS {
            log::warn!("Zero-length frame, stepping {} ms instead", MIN_FRAME_MILLIS);
            MIN_FRAME_MILLIS
        } else {
            elapsed_ms
        };
        let plan = SubstepPlan::for_elapsed(elapsed_ms as f32 / 1000.0, self.config.max_substep_seconds);

        let owners = OwnerTable::from_scene(&*scene);
        let bodies = self.spawn_dynamic_bodies(&*scene);
        self.apply_body_forces(&*scene, &bodies);
        self.integration_parameters.dt = plan.dt;
        self.sweep_static_pairs(&owners);

        let mut report = StepReport {
            substeps: plan.count,
            substep_seconds: plan.dt,
            dynamic_bodies: bodies.len(),
            ..Default::default()
        };

        for substep in 0..plan.count {
            let probes = self.sweep_candidates(&*scene, &owners, &bodies, local_avatar, &mut report);
            let probe_handles: Vec<ColliderHandle> =
                probes.into_iter().map(|p| self.collider_set.insert(p)).collect();

            self.step(&owners);

            for handle in probe_handles {
                self.remove_collider(handle);
            }
            if substep == 0 {
                self.clear_body_forces(&bodies);
            }
        }

        self.write_back(scene, &bodies);
        self.despawn_dynamic_bodies(&bodies);

        log::trace!(
            "Stepped {} body(ies) over {} sub-step(s) of {:.4}s",
            report.dynamic_bodies,
            report.substeps,
            report.substep_seconds
        );
        report
    }

    /// Run one Rapier step with the contact classifier installed.
    fn step(&mut self, owners: &OwnerTable) {
        let hooks = ContactClassifier::new(owners, &self.config);
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &hooks,
            &(),
        );
    }

    /// Visit every candidate pair involving a dynamic body once: record events, detect the
    /// local avatar's terrain and build the probe boxes for this sub-step.
    fn sweep_candidates<S: SceneProvider + ?Sized>(
        &mut self,
        scene: &S,
        owners: &OwnerTable,
        bodies: &[DynamicBody],
        local_avatar: Option<Reference>,
        report: &mut StepReport,
    ) -> Vec<Collider> {
        self.update_query_pipeline();

        let mut visited = HashSet::new();
        let mut probes = Vec::new();
        for body in bodies {
            let Some(collider) = self.collider_set.get(body.collider) else {
                continue;
            };
            let aabb = collider.compute_aabb();
            let mut candidates = Vec::new();
            self.query_pipeline
                .colliders_with_aabb_intersecting_aabb(&aabb, |handle| {
                    candidates.push(*handle);
                    true
                });

            for other in candidates {
                if other == body.collider || !visited.insert(pair_key(body.collider, other)) {
                    continue;
                }
                match self.resolve_pair(scene, owners, body.collider, other, local_avatar, report) {
                    Ok(Some(probe)) => probes.push(probe),
                    Ok(None) => {}
                    Err(e @ PhysicsError::TerrainNotReady(_)) => log::trace!("{}", e),
                    Err(e) => log::debug!("Skipping pair: {}", e),
                }
            }
        }
        probes
    }

    /// Record overlaps between static colliders, once per tick. No contacts are generated.
    fn sweep_static_pairs(&mut self, owners: &OwnerTable) {
        if !self.events.is_armed() {
            return;
        }
        self.update_query_pipeline();

        let statics: Vec<ColliderHandle> = self.static_store.handles().collect();
        let mut visited = HashSet::new();
        for handle in statics {
            let Some(collider) = self.collider_set.get(handle) else {
                continue;
            };
            let aabb = collider.compute_aabb();
            let mut candidates = Vec::new();
            self.query_pipeline
                .colliders_with_aabb_intersecting_aabb(&aabb, |other| {
                    candidates.push(*other);
                    true
                });

            for other in candidates {
                let other_is_static = self
                    .collider_set
                    .get(other)
                    .is_some_and(|c| c.parent().is_none());
                if other == handle || !other_is_static || !visited.insert(pair_key(handle, other)) {
                    continue;
                }
                if let Err(e) = self.admit_pair(owners, handle, other) {
                    log::debug!("Skipping static pair: {}", e);
                }
            }
        }
    }

    /// Resolve a candidate pair to its owners and classify it.
    ///
    /// Pairs that survive the skip rules are recorded in the event buffer before any contact
    /// or terrain handling, whether or not the shapes end up touching.
    fn admit_pair(
        &mut self,
        owners: &OwnerTable,
        h1: ColliderHandle,
        h2: ColliderHandle,
    ) -> Result<Option<(OwnerInfo, OwnerInfo, PairClass)>, PhysicsError> {
        let (c1, c2) = match (self.collider_set.get(h1), self.collider_set.get(h2)) {
            (Some(c1), Some(c2)) => (c1, c2),
            _ => return Ok(None),
        };
        let t1 = ColliderTag::from_user_data(c1.user_data);
        let t2 = ColliderTag::from_user_data(c2.user_data);
        if t1.is_probe() || t2.is_probe() {
            return Ok(None);
        }

        let a = *owners.get(t1.owner).ok_or(PhysicsError::MissingReference(t1.owner))?;
        let b = *owners.get(t2.owner).ok_or(PhysicsError::MissingReference(t2.owner))?;
        if a.reference == b.reference || self.joined(c1.parent(), c2.parent()) {
            return Ok(None);
        }

        let class = classify(&a, &b);
        if class == PairClass::Skip {
            return Ok(None);
        }
        self.record_event(a.reference, b.reference);
        Ok(Some((a, b, class)))
    }

    fn resolve_pair<S: SceneProvider + ?Sized>(
        &mut self,
        scene: &S,
        owners: &OwnerTable,
        h1: ColliderHandle,
        h2: ColliderHandle,
        local_avatar: Option<Reference>,
        report: &mut StepReport,
    ) -> Result<Option<Collider>, PhysicsError> {
        let Some((a, b, class)) = self.admit_pair(owners, h1, h2)? else {
            return Ok(None);
        };

        match class {
            // Rapier generates the contacts; the hooks shape them.
            PairClass::Skip | PairClass::Ordinary => Ok(None),
            PairClass::Terrain { terrain_first } => {
                let (terrain, terrain_collider, colliding, body_collider) = if terrain_first {
                    (a.reference, h1, b.reference, h2)
                } else {
                    (b.reference, h2, a.reference, h1)
                };
                self.terrain_pair(scene, terrain, terrain_collider, colliding, body_collider, local_avatar, report)
            }
        }
    }

    /// Apply the terrain heuristic to one body/terrain pair.
    #[allow(clippy::too_many_arguments)]
    fn terrain_pair<S: SceneProvider + ?Sized>(
        &mut self,
        scene: &S,
        terrain: Reference,
        terrain_collider: ColliderHandle,
        colliding: Reference,
        body_collider: ColliderHandle,
        local_avatar: Option<Reference>,
        report: &mut StepReport,
    ) -> Result<Option<Collider>, PhysicsError> {
        let terrain_object = scene.object(terrain).ok_or(PhysicsError::MissingReference(terrain))?;
        let surface = terrain_object
            .terrain
            .as_ref()
            .ok_or(PhysicsError::TerrainNotReady(terrain))?;

        if local_avatar == Some(colliding) {
            report.skybox_reference = Some(surface.skybox_reference.clone());
        }

        let grid = surface.grid.as_ref().ok_or(PhysicsError::TerrainNotReady(terrain))?;
        let (Some(terrain_co), Some(body_co)) = (
            self.collider_set.get(terrain_collider),
            self.collider_set.get(body_collider),
        ) else {
            return Ok(None);
        };

        let terrain_pose = from_isometry(terrain_co.position());
        let body_position = from_vector(&body_co.position().translation.vector);
        let Some(probe) = probe_box(body_position, terrain_pose, terrain_object.scale, grid, &self.config) else {
            return Ok(None);
        };

        let half = probe.half_extents;
        let probe_position = Isometry::translation(probe.center.x, probe.center.y, probe.center.z);
        let probe_shape = Cuboid::new(vector![half.x, half.y, half.z]);
        let touching = query::contact(
            body_co.position(),
            body_co.shape(),
            &probe_position,
            &probe_shape,
            self.config.probe_margin,
        )
        .map_err(|_| PhysicsError::UnsupportedShapePair(colliding, terrain))?
        .is_some();
        if !touching {
            return Ok(None);
        }

        report.terrain_contacts += 1;
        log::trace!("Terrain {} probes {} at cell {:?}", terrain, colliding, probe.cell);

        Ok(Some(
            ColliderBuilder::cuboid(half.x, half.y, half.z)
                .position(probe_position)
                .user_data(ColliderTag::probe(terrain, colliding).to_user_data())
                .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS | ActiveHooks::MODIFY_SOLVER_CONTACTS)
                .build(),
        ))
    }

    fn record_event(&mut self, target: Reference, colliding: Reference) {
        if let Err(e) = self.events.record(target, colliding) {
            if self.events.dropped() == 1 {
                log::warn!("{}, dropping further pairs this frame", e);
            }
        }
    }

    /// Whether two bodies are already articulated by a joint.
    fn joined(&self, b1: Option<RigidBodyHandle>, b2: Option<RigidBodyHandle>) -> bool {
        let (Some(b1), Some(b2)) = (b1, b2) else {
            return false;
        };
        self.impulse_joint_set
            .iter()
            .any(|(_, j)| (j.body1 == b1 && j.body2 == b2) || (j.body1 == b2 && j.body2 == b1))
    }

    /// Update query pipeline for raycasting.
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Remove a collider by its handle.
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.collider_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        );
    }

    /// Remove a rigid body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }
}

fn pair_key(a: ColliderHandle, b: ColliderHandle) -> ((u32, u32), (u32, u32)) {
    let (a, b) = (a.into_raw_parts(), b.into_raw_parts());
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
