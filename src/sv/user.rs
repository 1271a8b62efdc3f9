use crate::{
  entity::{UserRole, UserStatus, user},
  prelude::*,
};

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Profile {
  pub email: String,
  pub name: Option<String>,
  pub image_url: Option<String>,
}

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// First sign-in callback: creates the local row or refreshes the profile.
  pub async fn sync(
    &self,
    ctx: &AuthContext,
    profile: Profile,
  ) -> Result<user::Model> {
    let now = utils::now();

    if let Some(user) = self.by_clerk_id(&ctx.clerk_id).await? {
      let user = user::ActiveModel {
        email: Set(profile.email),
        name: Set(profile.name),
        image_url: Set(profile.image_url),
        updated_at: Set(now),
        ..user.into()
      }
      .update(self.db)
      .await?;
      return Ok(user);
    }

    let status = match ctx.role {
      UserRole::Tutor => UserStatus::Pending,
      UserRole::Admin | UserRole::Learner => UserStatus::Active,
    };

    let user = user::ActiveModel {
      id: Set(utils::new_id()),
      clerk_id: Set(ctx.clerk_id.clone()),
      email: Set(profile.email),
      name: Set(profile.name),
      image_url: Set(profile.image_url),
      role: Set(ctx.role),
      status: Set(status),
      points: Set(0),
      current_streak: Set(0),
      longest_streak: Set(0),
      streak_last_active_date: Set(None),
      interests: Set(None),
      goal: Set(None),
      metadata_synced: Set(ctx.status == Some(status)),
      created_at: Set(now),
      updated_at: Set(now),
    };

    let user = user.insert(self.db).await?;
    info!("New {:?} signed up: {}", user.role, user.id);
    Ok(user)
  }

  pub async fn by_id(&self, id: &str) -> Result<Option<user::Model>> {
    let user = user::Entity::find_by_id(id).one(self.db).await?;
    Ok(user)
  }

  pub async fn by_clerk_id(
    &self,
    clerk_id: &str,
  ) -> Result<Option<user::Model>> {
    let user = user::Entity::find()
      .filter(user::Column::ClerkId.eq(clerk_id))
      .one(self.db)
      .await?;
    Ok(user)
  }

  /// Local row of the caller; callers that never synced are unknown.
  pub async fn current(&self, ctx: &AuthContext) -> Result<user::Model> {
    self.by_clerk_id(&ctx.clerk_id).await?.ok_or(Error::NotFound("User"))
  }

  /// Caller allowed to author content: a tutor whose account is active.
  pub async fn active_tutor(&self, ctx: &AuthContext) -> Result<user::Model> {
    ctx.require_tutor()?;

    let user = self.current(ctx).await?;
    if user.role != UserRole::Tutor || user.status != UserStatus::Active {
      return Err(Error::Forbidden);
    }
    Ok(user)
  }

  /// Learner onboarding answers used by recommendations.
  pub async fn update_preferences(
    &self,
    ctx: &AuthContext,
    interests: Vec<String>,
    goal: Option<String>,
  ) -> Result<user::Model> {
    let user = self.current(ctx).await?;

    let interests = interests
      .iter()
      .map(|s| s.trim())
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>()
      .join(",");

    let user = user::ActiveModel {
      interests: Set((!interests.is_empty()).then_some(interests)),
      goal: Set(goal.filter(|g| !g.trim().is_empty())),
      updated_at: Set(utils::now()),
      ..user.into()
    }
    .update(self.db)
    .await?;

    Ok(user)
  }

  pub async fn count_by_role(&self, role: UserRole) -> Result<u64> {
    let count = user::Entity::find()
      .filter(user::Column::Role.eq(role))
      .count(self.db)
      .await?;
    Ok(count)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::{fixture, test_db};

  fn profile(email: &str) -> Profile {
    Profile { email: email.into(), ..Default::default() }
  }

  #[tokio::test]
  async fn test_sync_creates_once() {
    let db = test_db::setup().await;
    let sv = User::new(&db);
    let ctx = AuthContext::new("clerk_1", UserRole::Learner);

    let first = sv.sync(&ctx, profile("a@example.com")).await.unwrap();
    let second = sv.sync(&ctx, profile("b@example.com")).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.email, "b@example.com");
    assert_eq!(first.status, UserStatus::Active);
    assert_eq!(user::Entity::find().count(&db).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_tutor_starts_pending() {
    let db = test_db::setup().await;
    let sv = User::new(&db);
    let ctx = AuthContext::new("clerk_t", UserRole::Tutor);

    let tutor = sv.sync(&ctx, profile("t@example.com")).await.unwrap();
    assert_eq!(tutor.status, UserStatus::Pending);
    assert!(!tutor.metadata_synced);

    assert!(matches!(sv.active_tutor(&ctx).await, Err(Error::Forbidden)));
  }

  #[tokio::test]
  async fn test_unknown_caller() {
    let db = test_db::setup().await;
    let ctx = AuthContext::new("ghost", UserRole::Learner);

    assert!(matches!(
      User::new(&db).current(&ctx).await,
      Err(Error::NotFound("User"))
    ));
  }

  #[tokio::test]
  async fn test_preferences_are_normalized() {
    let db = test_db::setup().await;
    let learner = fixture::learner(&db).await;
    let ctx = fixture::ctx(&learner);

    let user = User::new(&db)
      .update_preferences(
        &ctx,
        vec![" Web ".into(), "".into(), "Data".into()],
        Some("  ".into()),
      )
      .await
      .unwrap();

    assert_eq!(user.interests.as_deref(), Some("Web,Data"));
    assert_eq!(user.interests(), vec!["web", "data"]);
    assert_eq!(user.goal, None);
  }
}
