use sea_orm::sea_query::Expr;
use serde::Serialize;

use crate::{
  entity::{
    LessonType, PointReason, daily_watch_time, lesson, point_transaction,
    quiz_attempt, user, user_progress,
  },
  prelude::*,
  sv,
  utils::{Page, PageQuery},
};

pub const MODULE_COMPLETION_POINTS: i32 = 10;
pub const QUIZ_MASTERY_POINTS: i32 = 25;
pub const STREAK_MILESTONE_POINTS: i32 = 70;
/// Minutes of watch time that count a day towards the streak
pub const STREAK_THRESHOLD_MINUTES: i32 = 30;
pub const STREAK_CYCLE_DAYS: i32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AwardOutcome {
  Awarded { points: i64 },
  AlreadyAwarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakUpdate {
  pub current: i32,
  pub longest: i32,
  pub milestone: Option<AwardOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchTick {
  pub minutes_today: i32,
  pub streak: Option<StreakUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
  pub points: i64,
  pub current_streak: i32,
  pub longest_streak: i32,
  pub minutes_today: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
  pub user_id: String,
  pub name: Option<String>,
  pub image_url: Option<String>,
  pub points: i64,
}

pub struct Gamification<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Gamification<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Credits `amount` once per (user, reason, reference).
  pub async fn award_points(
    &self,
    user_id: &str,
    amount: i32,
    reason: PointReason,
    reference_id: &str,
  ) -> Result<AwardOutcome> {
    let txn = self.db.begin().await?;

    user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::NotFound("User"))?;

    let key = (
      user_id.to_string(),
      reason.as_str().to_string(),
      reference_id.to_string(),
    );
    if point_transaction::Entity::find_by_id(key).one(&txn).await?.is_some() {
      return Ok(AwardOutcome::AlreadyAwarded);
    }

    point_transaction::ActiveModel {
      user_id: Set(user_id.to_string()),
      reason: Set(reason.as_str().to_string()),
      reference_id: Set(reference_id.to_string()),
      amount: Set(amount),
      created_at: Set(utils::now()),
    }
    .insert(&txn)
    .await?;

    user::Entity::update_many()
      .col_expr(
        user::Column::Points,
        Expr::col(user::Column::Points).add(amount as i64),
      )
      .filter(user::Column::Id.eq(user_id))
      .exec(&txn)
      .await?;

    let points = user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .map(|user| user.points)
      .ok_or(Error::NotFound("User"))?;

    txn.commit().await?;

    info!("Awarded {amount} points to {user_id} for {}", reason.as_str());
    Ok(AwardOutcome::Awarded { points })
  }

  /// Awards the chapter bonus once every lesson in it is completed.
  pub async fn check_module_completion(
    &self,
    user_id: &str,
    chapter_id: &str,
  ) -> Result<Option<AwardOutcome>> {
    let lesson_ids: Vec<String> = lesson::Entity::find()
      .select_only()
      .column(lesson::Column::Id)
      .filter(lesson::Column::ChapterId.eq(chapter_id))
      .into_tuple()
      .all(self.db)
      .await?;

    if lesson_ids.is_empty() {
      return Ok(None);
    }

    let total = lesson_ids.len() as u64;
    let completed = user_progress::Entity::find()
      .filter(user_progress::Column::UserId.eq(user_id))
      .filter(user_progress::Column::LessonId.is_in(lesson_ids))
      .filter(user_progress::Column::IsCompleted.eq(true))
      .count(self.db)
      .await?;

    if completed < total {
      return Ok(None);
    }

    let outcome = self
      .award_points(
        user_id,
        MODULE_COMPLETION_POINTS,
        PointReason::ModuleCompletion,
        chapter_id,
      )
      .await?;
    Ok(Some(outcome))
  }

  /// Awards the chapter bonus once every quiz in it has a passing attempt.
  /// Chapters without quizzes never award.
  pub async fn check_quiz_mastery(
    &self,
    user_id: &str,
    chapter_id: &str,
  ) -> Result<Option<AwardOutcome>> {
    let quiz_ids: Vec<String> = lesson::Entity::find()
      .select_only()
      .column(lesson::Column::Id)
      .filter(lesson::Column::ChapterId.eq(chapter_id))
      .filter(lesson::Column::LessonType.eq(LessonType::Quiz))
      .into_tuple()
      .all(self.db)
      .await?;

    if quiz_ids.is_empty() {
      return Ok(None);
    }

    let passed: Vec<String> = quiz_attempt::Entity::find()
      .select_only()
      .column(quiz_attempt::Column::LessonId)
      .distinct()
      .filter(quiz_attempt::Column::UserId.eq(user_id))
      .filter(quiz_attempt::Column::Passed.eq(true))
      .filter(quiz_attempt::Column::LessonId.is_in(quiz_ids.clone()))
      .into_tuple()
      .all(self.db)
      .await?;

    if passed.len() < quiz_ids.len() {
      return Ok(None);
    }

    let outcome = self
      .award_points(
        user_id,
        QUIZ_MASTERY_POINTS,
        PointReason::ModuleQuizMastery,
        chapter_id,
      )
      .await?;
    Ok(Some(outcome))
  }

  /// One heartbeat of video playback for the caller.
  pub async fn log_watch_minute(&self, ctx: &AuthContext) -> Result<WatchTick> {
    let user = sv::User::new(self.db).current(ctx).await?;
    self.log_watch_minute_on(&user.id, utils::today()).await
  }

  pub async fn log_watch_minute_on(
    &self,
    user_id: &str,
    today: NaiveDate,
  ) -> Result<WatchTick> {
    let date = utils::day_key(today);
    let now = utils::now();

    let txn = self.db.begin().await?;

    let before = daily_watch_time::Entity::find_by_id((
      user_id.to_string(),
      date.clone(),
    ))
    .one(&txn)
    .await?;

    let after = match before {
      Some(row) => {
        let minutes = row.minutes_watched + 1;
        daily_watch_time::ActiveModel {
          minutes_watched: Set(minutes),
          updated_at: Set(now),
          ..row.into()
        }
        .update(&txn)
        .await?;
        minutes
      }
      None => {
        daily_watch_time::ActiveModel {
          user_id: Set(user_id.to_string()),
          date: Set(date),
          minutes_watched: Set(1),
          updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        1
      }
    };

    txn.commit().await?;

    let crossed = after - 1 < STREAK_THRESHOLD_MINUTES
      && after >= STREAK_THRESHOLD_MINUTES;

    let streak = if crossed {
      Some(self.update_streak(user_id, today).await?)
    } else {
      None
    };

    Ok(WatchTick { minutes_today: after, streak })
  }

  /// Counts `today` towards the user's streak.
  pub async fn update_streak(
    &self,
    user_id: &str,
    today: NaiveDate,
  ) -> Result<StreakUpdate> {
    let user = user::Entity::find_by_id(user_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("User"))?;

    let yesterday = today.pred_opt();
    let current = match user.streak_last_active_date {
      Some(last) if last == today => {
        return Ok(StreakUpdate {
          current: user.current_streak,
          longest: user.longest_streak,
          milestone: None,
        });
      }
      Some(last) if Some(last) == yesterday => user.current_streak + 1,
      _ => 1,
    };
    let longest = user.longest_streak.max(current);

    user::ActiveModel {
      current_streak: Set(current),
      longest_streak: Set(longest),
      streak_last_active_date: Set(Some(today)),
      updated_at: Set(utils::now()),
      ..user.into()
    }
    .update(self.db)
    .await?;

    let milestone = if current > 0 && current % STREAK_CYCLE_DAYS == 0 {
      let reference =
        format!("STREAK_{}_{}", current, utils::day_key(today));
      let outcome = self
        .award_points(
          user_id,
          STREAK_MILESTONE_POINTS,
          PointReason::StreakMilestone,
          &reference,
        )
        .await?;
      Some(outcome)
    } else {
      None
    };

    debug!("Streak of {user_id} is now {current} (longest {longest})");
    Ok(StreakUpdate { current, longest, milestone })
  }

  pub async fn summary(&self, ctx: &AuthContext) -> Result<Summary> {
    let user = sv::User::new(self.db).current(ctx).await?;

    let minutes_today = daily_watch_time::Entity::find_by_id((
      user.id.clone(),
      utils::day_key(utils::today()),
    ))
    .one(self.db)
    .await?
    .map(|row| row.minutes_watched)
    .unwrap_or(0);

    Ok(Summary {
      points: user.points,
      current_streak: user.current_streak,
      longest_streak: user.longest_streak,
      minutes_today,
    })
  }

  pub async fn history(
    &self,
    ctx: &AuthContext,
    query: &PageQuery,
  ) -> Result<Page<point_transaction::Model>> {
    let user = sv::User::new(self.db).current(ctx).await?;

    let select = point_transaction::Entity::find()
      .filter(point_transaction::Column::UserId.eq(user.id));

    let (total, items) = futures::try_join!(
      select.clone().count(self.db),
      select
        .order_by_desc(point_transaction::Column::CreatedAt)
        .offset(query.offset())
        .limit(query.limit())
        .all(self.db),
    )?;

    Ok(Page::new(items, total, query))
  }

  pub async fn leaderboard(&self, limit: u64) -> Result<Vec<LeaderboardEntry>> {
    let users = user::Entity::find()
      .filter(user::Column::Role.eq(crate::entity::UserRole::Learner))
      .order_by_desc(user::Column::Points)
      .order_by_asc(user::Column::CreatedAt)
      .limit(limit.clamp(1, utils::MAX_PAGE_LIMIT))
      .all(self.db)
      .await?;

    Ok(
      users
        .into_iter()
        .map(|user| LeaderboardEntry {
          user_id: user.id,
          name: user.name,
          image_url: user.image_url,
          points: user.points,
        })
        .collect(),
    )
  }
}
