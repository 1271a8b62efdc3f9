//! Admin moderation of tutors and courses.
//!
//! The local row is the source of truth. Tutor status changes are mirrored
//! into the identity provider on a best-effort basis; rows that failed to
//! mirror keep `metadata_synced = false` and are retried by [`reconcile`].
//!
//! [`reconcile`]: Moderation::reconcile

use crate::{
  entity::{CourseStatus, UserRole, UserStatus, course, user},
  prelude::*,
  sv::{self, clerk::Identity, mail, mail::Mailer},
  utils::{Page, PageQuery},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TutorAction {
  Approve,
  Reject,
  Suspend,
  Retract,
  Ban,
  Unban,
}

impl TutorAction {
  /// Statuses the action may start from and the status it leads to.
  pub fn rule(self) -> (&'static [UserStatus], UserStatus) {
    use UserStatus::*;

    match self {
      Self::Approve => (&[Pending], Active),
      Self::Reject => (&[Pending], Rejected),
      Self::Suspend => (&[Active], Suspended),
      Self::Retract => (&[Suspended], Active),
      Self::Ban => (&[Active, Suspended], Banned),
      Self::Unban => (&[Banned], Active),
    }
  }
}

pub struct Moderation<'a> {
  db: &'a DatabaseConnection,
  identity: Arc<dyn Identity>,
  mailer: Arc<dyn Mailer>,
}

impl<'a> Moderation<'a> {
  pub fn new(
    db: &'a DatabaseConnection,
    identity: Arc<dyn Identity>,
    mailer: Arc<dyn Mailer>,
  ) -> Self {
    Self { db, identity, mailer }
  }

  async fn tutor(&self, id: &str) -> Result<user::Model> {
    sv::User::new(self.db)
      .by_id(id)
      .await?
      .filter(|user| user.role == UserRole::Tutor)
      .ok_or(Error::NotFound("Tutor"))
  }

  /// Pushes the local status to the identity provider. Failures are logged
  /// and left for reconciliation.
  async fn mirror(&self, user: user::Model) -> Result<user::Model> {
    if let Err(err) =
      self.identity.set_status(&user.clerk_id, user.role, user.status).await
    {
      warn!("Failed to mirror status of {} ({:?}): {err}", user.id, user.status);
      return Ok(user);
    }

    let user = user::ActiveModel { metadata_synced: Set(true), ..user.into() }
      .update(self.db)
      .await?;
    Ok(user)
  }

  pub async fn transition(
    &self,
    ctx: &AuthContext,
    tutor_id: &str,
    action: TutorAction,
  ) -> Result<user::Model> {
    ctx.require_admin()?;

    let tutor = self.tutor(tutor_id).await?;
    let (from, to) = action.rule();
    if !from.contains(&tutor.status) {
      return Err(Error::transition(tutor.status, to));
    }

    let tutor = user::ActiveModel {
      status: Set(to),
      metadata_synced: Set(false),
      updated_at: Set(utils::now()),
      ..tutor.into()
    }
    .update(self.db)
    .await?;

    info!("Tutor {} is now {:?} ({action:?})", tutor.id, to);
    let tutor = self.mirror(tutor).await?;

    if action == TutorAction::Approve {
      self.notify_approved(&tutor);
    }

    Ok(tutor)
  }

  fn notify_approved(&self, tutor: &user::Model) {
    let mailer = self.mailer.clone();
    let to = tutor.email.clone();
    let (subject, html) = mail::tutor_approved(tutor.name.as_deref());

    tokio::spawn(async move {
      if let Err(err) = mailer.send(&to, &subject, &html).await {
        warn!("Approval mail to {to} failed: {err}");
      }
    });
  }

  pub async fn approve_tutor(
    &self,
    ctx: &AuthContext,
    id: &str,
  ) -> Result<user::Model> {
    self.transition(ctx, id, TutorAction::Approve).await
  }

  pub async fn reject_tutor(
    &self,
    ctx: &AuthContext,
    id: &str,
  ) -> Result<user::Model> {
    self.transition(ctx, id, TutorAction::Reject).await
  }

  pub async fn suspend_tutor(
    &self,
    ctx: &AuthContext,
    id: &str,
  ) -> Result<user::Model> {
    self.transition(ctx, id, TutorAction::Suspend).await
  }

  pub async fn retract_suspension(
    &self,
    ctx: &AuthContext,
    id: &str,
  ) -> Result<user::Model> {
    self.transition(ctx, id, TutorAction::Retract).await
  }

  pub async fn ban_tutor(
    &self,
    ctx: &AuthContext,
    id: &str,
  ) -> Result<user::Model> {
    self.transition(ctx, id, TutorAction::Ban).await
  }

  pub async fn unban_tutor(
    &self,
    ctx: &AuthContext,
    id: &str,
  ) -> Result<user::Model> {
    self.transition(ctx, id, TutorAction::Unban).await
  }

  pub async fn pending_tutors(
    &self,
    ctx: &AuthContext,
  ) -> Result<Vec<user::Model>> {
    ctx.require_admin()?;

    let tutors = user::Entity::find()
      .filter(user::Column::Role.eq(UserRole::Tutor))
      .filter(user::Column::Status.eq(UserStatus::Pending))
      .order_by_asc(user::Column::CreatedAt)
      .all(self.db)
      .await?;
    Ok(tutors)
  }

  pub async fn all_tutors(
    &self,
    ctx: &AuthContext,
    query: &PageQuery,
  ) -> Result<Page<user::Model>> {
    ctx.require_admin()?;

    let select =
      user::Entity::find().filter(user::Column::Role.eq(UserRole::Tutor));

    let (total, items) = futures::try_join!(
      select.clone().count(self.db),
      select
        .order_by_desc(user::Column::CreatedAt)
        .offset(query.offset())
        .limit(query.limit())
        .all(self.db),
    )?;

    Ok(Page::new(items, total, query))
  }

  pub async fn pending_courses(
    &self,
    ctx: &AuthContext,
  ) -> Result<Vec<course::Model>> {
    ctx.require_admin()?;

    let courses = course::Entity::find()
      .filter(course::Column::Status.eq(CourseStatus::Pending))
      .order_by_asc(course::Column::UpdatedAt)
      .all(self.db)
      .await?;
    Ok(courses)
  }

  async fn pending_course(&self, id: &str, to: CourseStatus) -> Result<course::Model> {
    let course = sv::Course::new(self.db).by_id(id).await?;
    if course.status != CourseStatus::Pending {
      return Err(Error::transition(course.status, to));
    }
    Ok(course)
  }

  /// PENDING -> PUBLISHED.
  pub async fn approve_course(
    &self,
    ctx: &AuthContext,
    id: &str,
  ) -> Result<course::Model> {
    ctx.require_admin()?;
    let course = self.pending_course(id, CourseStatus::Published).await?;

    let course = course::ActiveModel {
      status: Set(CourseStatus::Published),
      is_published: Set(true),
      rejection_reason: Set(None),
      updated_at: Set(utils::now()),
      ..course.into()
    }
    .update(self.db)
    .await?;

    info!("Course `{}` published", course.id);
    Ok(course)
  }

  /// PENDING -> REJECTED; the owner may edit and resubmit.
  pub async fn reject_course(
    &self,
    ctx: &AuthContext,
    id: &str,
    reason: Option<String>,
  ) -> Result<course::Model> {
    ctx.require_admin()?;
    let course = self.pending_course(id, CourseStatus::Rejected).await?;

    let course = course::ActiveModel {
      status: Set(CourseStatus::Rejected),
      is_published: Set(false),
      rejection_reason: Set(reason.filter(|r| !r.trim().is_empty())),
      updated_at: Set(utils::now()),
      ..course.into()
    }
    .update(self.db)
    .await?;

    info!("Course `{}` rejected", course.id);
    Ok(course)
  }

  /// Retries mirroring for up to `limit` users; returns how many succeeded.
  pub async fn reconcile(&self, limit: u64) -> Result<u64> {
    let stale = user::Entity::find()
      .filter(user::Column::MetadataSynced.eq(false))
      .order_by_asc(user::Column::UpdatedAt)
      .limit(limit)
      .all(self.db)
      .await?;

    let mut synced = 0;
    for user in stale {
      if self.mirror(user).await?.metadata_synced {
        synced += 1;
      }
    }
    Ok(synced)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::Ordering;

  use super::*;
  use crate::sv::test_utils::{FakeIdentity, FakeMailer, fixture, test_db};

  struct Admin {
    db: DatabaseConnection,
    identity: Arc<FakeIdentity>,
    mailer: Arc<FakeMailer>,
    ctx: AuthContext,
  }

  impl Admin {
    async fn new() -> Self {
      let db = test_db::setup().await;
      let admin = fixture::admin(&db).await;
      Self {
        ctx: fixture::ctx(&admin),
        db,
        identity: Arc::new(FakeIdentity::default()),
        mailer: Arc::new(FakeMailer::default()),
      }
    }

    fn sv(&self) -> Moderation<'_> {
      Moderation::new(&self.db, self.identity.clone(), self.mailer.clone())
    }
  }

  #[tokio::test]
  async fn test_approve_mirrors_and_mails() {
    let admin = Admin::new().await;
    let tutor = fixture::user(&admin.db, UserRole::Tutor, UserStatus::Pending).await;

    let approved = admin.sv().approve_tutor(&admin.ctx, &tutor.id).await.unwrap();
    assert_eq!(approved.status, UserStatus::Active);
    assert!(approved.metadata_synced);
    assert_eq!(
      admin.identity.calls.lock().unwrap().as_slice(),
      &[(tutor.clerk_id.clone(), UserStatus::Active)]
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(admin.mailer.sent.lock().unwrap()[0].0, tutor.email);
  }

  #[tokio::test]
  async fn test_mirror_failure_is_swallowed_then_reconciled() {
    let admin = Admin::new().await;
    let tutor = fixture::tutor(&admin.db).await;
    admin.identity.fail.store(true, Ordering::Relaxed);

    let suspended =
      admin.sv().suspend_tutor(&admin.ctx, &tutor.id).await.unwrap();
    assert_eq!(suspended.status, UserStatus::Suspended);
    assert!(!suspended.metadata_synced);

    assert_eq!(admin.sv().reconcile(10).await.unwrap(), 0);

    admin.identity.fail.store(false, Ordering::Relaxed);
    assert_eq!(admin.sv().reconcile(10).await.unwrap(), 1);

    let user = user::Entity::find_by_id(&tutor.id)
      .one(&admin.db)
      .await
      .unwrap()
      .unwrap();
    assert!(user.metadata_synced);
    assert_eq!(user.status, UserStatus::Suspended);
  }

  #[tokio::test]
  async fn test_tutor_state_machine() {
    let admin = Admin::new().await;
    let tutor = fixture::tutor(&admin.db).await;
    let sv = admin.sv();
    let ctx = &admin.ctx;

    assert!(matches!(
      sv.approve_tutor(ctx, &tutor.id).await,
      Err(Error::InvalidTransition { .. })
    ));
    assert!(matches!(
      sv.unban_tutor(ctx, &tutor.id).await,
      Err(Error::InvalidTransition { .. })
    ));

    sv.suspend_tutor(ctx, &tutor.id).await.unwrap();
    assert_eq!(
      sv.ban_tutor(ctx, &tutor.id).await.unwrap().status,
      UserStatus::Banned
    );
    assert_eq!(
      sv.unban_tutor(ctx, &tutor.id).await.unwrap().status,
      UserStatus::Active
    );

    sv.suspend_tutor(ctx, &tutor.id).await.unwrap();
    assert_eq!(
      sv.retract_suspension(ctx, &tutor.id).await.unwrap().status,
      UserStatus::Active
    );
  }

  #[tokio::test]
  async fn test_only_admins_moderate() {
    let admin = Admin::new().await;
    let tutor = fixture::user(&admin.db, UserRole::Tutor, UserStatus::Pending).await;
    let learner = fixture::learner(&admin.db).await;

    let result =
      admin.sv().approve_tutor(&fixture::ctx(&learner), &tutor.id).await;
    assert!(matches!(result, Err(Error::Forbidden)));

    let result = admin.sv().ban_tutor(&admin.ctx, &learner.id).await;
    assert!(matches!(result, Err(Error::NotFound("Tutor"))));
  }

  #[tokio::test]
  async fn test_draft_course_cannot_be_approved() {
    let admin = Admin::new().await;
    let tutor = fixture::tutor(&admin.db).await;
    let draft =
      fixture::course(&admin.db, &tutor.id, "d", None, CourseStatus::Draft)
        .await;

    let result = admin.sv().approve_course(&admin.ctx, &draft.id).await;
    assert!(matches!(result, Err(Error::InvalidTransition { .. })));

    let course = sv::Course::new(&admin.db).by_id(&draft.id).await.unwrap();
    assert_eq!(course.status, CourseStatus::Draft);
    assert!(!course.is_published);
  }

  #[tokio::test]
  async fn test_course_review() {
    let admin = Admin::new().await;
    let tutor = fixture::tutor(&admin.db).await;
    let a =
      fixture::course(&admin.db, &tutor.id, "a", None, CourseStatus::Pending)
        .await;
    let b =
      fixture::course(&admin.db, &tutor.id, "b", None, CourseStatus::Pending)
        .await;
    let sv = admin.sv();

    assert_eq!(sv.pending_courses(&admin.ctx).await.unwrap().len(), 2);

    let published = sv.approve_course(&admin.ctx, &a.id).await.unwrap();
    assert_eq!(published.status, CourseStatus::Published);
    assert!(published.is_published);

    let rejected = sv
      .reject_course(&admin.ctx, &b.id, Some("Missing lessons".into()))
      .await
      .unwrap();
    assert_eq!(rejected.status, CourseStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Missing lessons"));

    assert!(sv.pending_courses(&admin.ctx).await.unwrap().is_empty());
  }
}
