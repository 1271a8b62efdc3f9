use sea_orm::sea_query::OnConflict;
use serde::Serialize;

use crate::{
  entity::{course, course_like, purchase, review, wishlist},
  prelude::*,
  sv,
  utils::{Page, PageQuery},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStats {
  pub average_rating: Option<f64>,
  pub review_count: u64,
  pub like_count: u64,
  pub enrollment_count: u64,
}

/// Mean rating rounded to one decimal.
pub fn average(ratings: &[i32]) -> Option<f64> {
  if ratings.is_empty() {
    return None;
  }
  let sum: i64 = ratings.iter().map(|&r| r as i64).sum();
  let mean = sum as f64 / ratings.len() as f64;
  Some((mean * 10.0).round() / 10.0)
}

pub struct Engagement<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Engagement<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// One review per learner and course; only buyers may review.
  pub async fn upsert_review(
    &self,
    ctx: &AuthContext,
    course_id: &str,
    rating: i32,
    comment: Option<String>,
  ) -> Result<review::Model> {
    if !(1..=5).contains(&rating) {
      return Err(Error::InvalidArgs("Rating must be between 1 and 5".into()));
    }

    let user = sv::User::new(self.db).current(ctx).await?;
    let course = sv::Course::new(self.db).by_id(course_id).await?;

    let purchased = purchase::Entity::find()
      .filter(purchase::Column::UserId.eq(user.id.as_str()))
      .filter(purchase::Column::CourseId.eq(course.id.as_str()))
      .count(self.db)
      .await?;
    if purchased == 0 {
      return Err(Error::Forbidden);
    }

    let now = utils::now();
    let row = review::ActiveModel {
      user_id: Set(user.id.clone()),
      course_id: Set(course.id.clone()),
      rating: Set(rating),
      comment: Set(comment.filter(|c| !c.trim().is_empty())),
      created_at: Set(now),
      updated_at: Set(now),
    };

    review::Entity::insert(row)
      .on_conflict(
        OnConflict::columns([review::Column::UserId, review::Column::CourseId])
          .update_columns([
            review::Column::Rating,
            review::Column::Comment,
            review::Column::UpdatedAt,
          ])
          .to_owned(),
      )
      .exec_without_returning(self.db)
      .await?;

    review::Entity::find_by_id((user.id, course.id))
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Review"))
  }

  pub async fn delete_review(
    &self,
    ctx: &AuthContext,
    course_id: &str,
  ) -> Result<()> {
    let user = sv::User::new(self.db).current(ctx).await?;

    let deleted =
      review::Entity::delete_by_id((user.id, course_id.to_string()))
        .exec(self.db)
        .await?;
    if deleted.rows_affected == 0 {
      return Err(Error::NotFound("Review"));
    }
    Ok(())
  }

  pub async fn reviews(
    &self,
    course_id: &str,
    query: &PageQuery,
  ) -> Result<Page<review::Model>> {
    let select =
      review::Entity::find().filter(review::Column::CourseId.eq(course_id));

    let (total, items) = futures::try_join!(
      select.clone().count(self.db),
      select
        .order_by_desc(review::Column::UpdatedAt)
        .offset(query.offset())
        .limit(query.limit())
        .all(self.db),
    )?;

    Ok(Page::new(items, total, query))
  }

  pub async fn course_stats(&self, course_id: &str) -> Result<CourseStats> {
    let ratings = review::Entity::find()
      .select_only()
      .column(review::Column::Rating)
      .filter(review::Column::CourseId.eq(course_id))
      .into_tuple::<i32>()
      .all(self.db);
    let likes = course_like::Entity::find()
      .filter(course_like::Column::CourseId.eq(course_id))
      .count(self.db);
    let enrollments = purchase::Entity::find()
      .filter(purchase::Column::CourseId.eq(course_id))
      .count(self.db);

    let (ratings, like_count, enrollment_count) =
      futures::try_join!(ratings, likes, enrollments)?;

    Ok(CourseStats {
      average_rating: average(&ratings),
      review_count: ratings.len() as u64,
      like_count,
      enrollment_count,
    })
  }

  /// Flips the caller's like; returns whether the course is now liked.
  pub async fn toggle_like(
    &self,
    ctx: &AuthContext,
    course_id: &str,
  ) -> Result<bool> {
    let user = sv::User::new(self.db).current(ctx).await?;
    let course = sv::Course::new(self.db).by_id(course_id).await?;

    let removed =
      course_like::Entity::delete_by_id((user.id.clone(), course.id.clone()))
        .exec(self.db)
        .await?;
    if removed.rows_affected > 0 {
      return Ok(false);
    }

    course_like::ActiveModel {
      user_id: Set(user.id),
      course_id: Set(course.id),
      created_at: Set(utils::now()),
    }
    .insert(self.db)
    .await?;

    Ok(true)
  }

  pub async fn add_to_wishlist(
    &self,
    ctx: &AuthContext,
    course_id: &str,
  ) -> Result<()> {
    let user = sv::User::new(self.db).current(ctx).await?;
    let course = sv::Course::new(self.db).by_id(course_id).await?;

    let row = wishlist::ActiveModel {
      user_id: Set(user.id),
      course_id: Set(course.id),
      created_at: Set(utils::now()),
    };

    wishlist::Entity::insert(row)
      .on_conflict(
        OnConflict::columns([
          wishlist::Column::UserId,
          wishlist::Column::CourseId,
        ])
        .do_nothing()
        .to_owned(),
      )
      .exec_without_returning(self.db)
      .await?;

    Ok(())
  }

  pub async fn remove_from_wishlist(
    &self,
    ctx: &AuthContext,
    course_id: &str,
  ) -> Result<()> {
    let user = sv::User::new(self.db).current(ctx).await?;
    wishlist::Entity::delete_by_id((user.id, course_id.to_string()))
      .exec(self.db)
      .await?;
    Ok(())
  }

  pub async fn wishlist(&self, ctx: &AuthContext) -> Result<Vec<course::Model>> {
    let user = sv::User::new(self.db).current(ctx).await?;

    let courses = wishlist::Entity::find()
      .filter(wishlist::Column::UserId.eq(user.id))
      .order_by_desc(wishlist::Column::CreatedAt)
      .find_also_related(course::Entity)
      .all(self.db)
      .await?
      .into_iter()
      .filter_map(|(_, course)| course)
      .collect();

    Ok(courses)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::CourseStatus,
    sv::test_utils::{fixture, test_db},
  };

  #[test]
  fn test_average() {
    assert_eq!(average(&[]), None);
    assert_eq!(average(&[5, 4, 4]), Some(4.3));
  }

  #[tokio::test]
  async fn test_review_is_upserted() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let learner = fixture::learner(&db).await;
    let ctx = fixture::ctx(&learner);
    let course =
      fixture::course(&db, &tutor.id, "c", Some(100), CourseStatus::Published)
        .await;
    let sv = Engagement::new(&db);

    assert!(matches!(
      sv.upsert_review(&ctx, &course.id, 5, None).await,
      Err(Error::Forbidden)
    ));

    fixture::purchase(&db, &learner.id, &course.id, 100).await;
    sv.upsert_review(&ctx, &course.id, 5, None).await.unwrap();
    let review = sv
      .upsert_review(&ctx, &course.id, 3, Some("Too fast".into()))
      .await
      .unwrap();

    assert_eq!(review.rating, 3);
    assert_eq!(review::Entity::find().count(&db).await.unwrap(), 1);

    assert!(matches!(
      sv.upsert_review(&ctx, &course.id, 6, None).await,
      Err(Error::InvalidArgs(_))
    ));
  }

  #[tokio::test]
  async fn test_stats() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let course =
      fixture::course(&db, &tutor.id, "c", None, CourseStatus::Published).await;
    let sv = Engagement::new(&db);

    for rating in [4, 5] {
      let learner = fixture::learner(&db).await;
      let ctx = fixture::ctx(&learner);
      fixture::purchase(&db, &learner.id, &course.id, 0).await;
      sv.upsert_review(&ctx, &course.id, rating, None).await.unwrap();
      sv.toggle_like(&ctx, &course.id).await.unwrap();
    }

    let stats = sv.course_stats(&course.id).await.unwrap();
    assert_eq!(
      stats,
      CourseStats {
        average_rating: Some(4.5),
        review_count: 2,
        like_count: 2,
        enrollment_count: 2,
      }
    );
  }

  #[tokio::test]
  async fn test_like_toggles() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let learner = fixture::learner(&db).await;
    let ctx = fixture::ctx(&learner);
    let course =
      fixture::course(&db, &tutor.id, "c", None, CourseStatus::Published).await;
    let sv = Engagement::new(&db);

    assert!(sv.toggle_like(&ctx, &course.id).await.unwrap());
    assert!(!sv.toggle_like(&ctx, &course.id).await.unwrap());
    assert_eq!(course_like::Entity::find().count(&db).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_wishlist() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let learner = fixture::learner(&db).await;
    let ctx = fixture::ctx(&learner);
    let course =
      fixture::course(&db, &tutor.id, "c", None, CourseStatus::Published).await;
    let sv = Engagement::new(&db);

    sv.add_to_wishlist(&ctx, &course.id).await.unwrap();
    sv.add_to_wishlist(&ctx, &course.id).await.unwrap();
    assert_eq!(sv.wishlist(&ctx).await.unwrap().len(), 1);

    sv.remove_from_wishlist(&ctx, &course.id).await.unwrap();
    assert!(sv.wishlist(&ctx).await.unwrap().is_empty());
  }
}
