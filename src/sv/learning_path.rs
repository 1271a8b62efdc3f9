use sea_orm::{DatabaseTransaction, sea_query::Expr};
use serde::{Deserialize, Serialize};

use crate::{
  entity::{course, learning_path, learning_path_course, user_learning_path},
  prelude::*,
  sv::{self, progress::CourseProgress},
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathInput {
  pub title: String,
  pub description: Option<String>,
  pub image_url: Option<String>,
  pub price: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSummary {
  #[serde(flatten)]
  pub path: learning_path::Model,
  pub course_count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDetail {
  #[serde(flatten)]
  pub path: learning_path::Model,
  pub courses: Vec<course::Model>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledPath {
  #[serde(flatten)]
  pub path: learning_path::Model,
  pub enrolled_at: DateTime,
  pub progress: CourseProgress,
}

fn validate(input: PathInput) -> Result<PathInput> {
  if input.title.trim().is_empty() {
    return Err(Error::InvalidArgs("Title is required".into()));
  }
  if input.price.is_some_and(|price| price < 0) {
    return Err(Error::InvalidArgs("Price cannot be negative".into()));
  }
  Ok(input)
}

async fn course_ids(
  txn: &DatabaseTransaction,
  path_id: &str,
) -> Result<Vec<String>> {
  let ids = learning_path_course::Entity::find()
    .select_only()
    .column(learning_path_course::Column::CourseId)
    .filter(learning_path_course::Column::PathId.eq(path_id))
    .order_by_asc(learning_path_course::Column::Position)
    .into_tuple()
    .all(txn)
    .await?;
  Ok(ids)
}

async fn write_positions(
  txn: &DatabaseTransaction,
  path_id: &str,
  ids: &[String],
) -> Result<()> {
  for (index, id) in ids.iter().enumerate() {
    learning_path_course::Entity::update_many()
      .col_expr(
        learning_path_course::Column::Position,
        Expr::value(index as i32 + 1),
      )
      .filter(learning_path_course::Column::PathId.eq(path_id))
      .filter(learning_path_course::Column::CourseId.eq(id.as_str()))
      .exec(txn)
      .await?;
  }
  Ok(())
}

pub struct LearningPath<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> LearningPath<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_id(&self, id: &str) -> Result<learning_path::Model> {
    learning_path::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Learning path"))
  }

  pub async fn create(
    &self,
    ctx: &AuthContext,
    input: PathInput,
  ) -> Result<learning_path::Model> {
    ctx.require_admin()?;
    let admin = sv::User::new(self.db).current(ctx).await?;
    let input = validate(input)?;
    let now = utils::now();

    let path = learning_path::ActiveModel {
      id: Set(utils::new_id()),
      title: Set(input.title.trim().to_string()),
      description: Set(input.description),
      image_url: Set(input.image_url),
      price: Set(input.price),
      is_published: Set(false),
      created_by: Set(Some(admin.id)),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(self.db)
    .await?;

    Ok(path)
  }

  pub async fn update(
    &self,
    ctx: &AuthContext,
    id: &str,
    input: PathInput,
  ) -> Result<learning_path::Model> {
    ctx.require_admin()?;
    let path = self.by_id(id).await?;
    let input = validate(input)?;

    let path = learning_path::ActiveModel {
      title: Set(input.title.trim().to_string()),
      description: Set(input.description),
      image_url: Set(input.image_url),
      price: Set(input.price),
      updated_at: Set(utils::now()),
      ..path.into()
    }
    .update(self.db)
    .await?;

    Ok(path)
  }

  pub async fn delete(&self, ctx: &AuthContext, id: &str) -> Result<()> {
    ctx.require_admin()?;
    let path = self.by_id(id).await?;
    learning_path::Entity::delete_by_id(path.id).exec(self.db).await?;
    Ok(())
  }

  /// Appends a published course to the path.
  pub async fn add_course(
    &self,
    ctx: &AuthContext,
    path_id: &str,
    course_id: &str,
  ) -> Result<learning_path_course::Model> {
    ctx.require_admin()?;
    let path = self.by_id(path_id).await?;
    let course = sv::Course::new(self.db).by_id(course_id).await?;

    if !course.is_published {
      return Err(Error::InvalidArgs("Only published courses can be added".into()));
    }

    let key = (path.id.clone(), course.id.clone());
    if learning_path_course::Entity::find_by_id(key).one(self.db).await?.is_some()
    {
      return Err(Error::Conflict("Course is already in the path".into()));
    }

    let count = learning_path_course::Entity::find()
      .filter(learning_path_course::Column::PathId.eq(path.id.as_str()))
      .count(self.db)
      .await?;

    let entry = learning_path_course::ActiveModel {
      path_id: Set(path.id),
      course_id: Set(course.id),
      position: Set(count as i32 + 1),
    }
    .insert(self.db)
    .await?;

    Ok(entry)
  }

  pub async fn remove_course(
    &self,
    ctx: &AuthContext,
    path_id: &str,
    course_id: &str,
  ) -> Result<()> {
    ctx.require_admin()?;

    let txn = self.db.begin().await?;
    let removed = learning_path_course::Entity::delete_by_id((
      path_id.to_string(),
      course_id.to_string(),
    ))
    .exec(&txn)
    .await?;

    if removed.rows_affected == 0 {
      return Err(Error::NotFound("Path course"));
    }

    let rest = course_ids(&txn, path_id).await?;
    write_positions(&txn, path_id, &rest).await?;

    // a published path always lists at least one course
    if rest.is_empty() {
      learning_path::Entity::update_many()
        .col_expr(learning_path::Column::IsPublished, Expr::value(false))
        .col_expr(learning_path::Column::UpdatedAt, Expr::value(utils::now()))
        .filter(learning_path::Column::Id.eq(path_id))
        .exec(&txn)
        .await?;
    }
    txn.commit().await?;

    Ok(())
  }

  pub async fn reorder_courses(
    &self,
    ctx: &AuthContext,
    path_id: &str,
    ids: Vec<String>,
  ) -> Result<()> {
    ctx.require_admin()?;

    let txn = self.db.begin().await?;
    let current = course_ids(&txn, path_id).await?;
    sv::content::check_order(&current, &ids)?;

    write_positions(&txn, path_id, &ids).await?;
    txn.commit().await?;

    Ok(())
  }

  /// Publishing requires at least one course.
  pub async fn set_published(
    &self,
    ctx: &AuthContext,
    id: &str,
    published: bool,
  ) -> Result<learning_path::Model> {
    ctx.require_admin()?;
    let path = self.by_id(id).await?;

    if published {
      let count = learning_path_course::Entity::find()
        .filter(learning_path_course::Column::PathId.eq(path.id.as_str()))
        .count(self.db)
        .await?;
      if count == 0 {
        return Err(Error::InvalidArgs(
          "Add at least one course before publishing".into(),
        ));
      }
    }

    let path = learning_path::ActiveModel {
      is_published: Set(published),
      updated_at: Set(utils::now()),
      ..path.into()
    }
    .update(self.db)
    .await?;

    Ok(path)
  }

  async fn summaries(
    &self,
    paths: Vec<learning_path::Model>,
  ) -> Result<Vec<PathSummary>> {
    let ids: Vec<String> = paths.iter().map(|p| p.id.clone()).collect();

    let counts: HashMap<String, i64> = learning_path_course::Entity::find()
      .select_only()
      .column(learning_path_course::Column::PathId)
      .column_as(learning_path_course::Column::CourseId.count(), "courses")
      .filter(learning_path_course::Column::PathId.is_in(ids))
      .group_by(learning_path_course::Column::PathId)
      .into_tuple::<(String, i64)>()
      .all(self.db)
      .await?
      .into_iter()
      .collect();

    Ok(
      paths
        .into_iter()
        .map(|path| PathSummary {
          course_count: counts.get(&path.id).copied().unwrap_or(0) as u64,
          path,
        })
        .collect(),
    )
  }

  pub async fn published_paths(&self) -> Result<Vec<PathSummary>> {
    let paths = learning_path::Entity::find()
      .filter(learning_path::Column::IsPublished.eq(true))
      .order_by_desc(learning_path::Column::CreatedAt)
      .all(self.db)
      .await?;
    self.summaries(paths).await
  }

  pub async fn all_paths(&self, ctx: &AuthContext) -> Result<Vec<PathSummary>> {
    ctx.require_admin()?;
    let paths = learning_path::Entity::find()
      .order_by_desc(learning_path::Column::CreatedAt)
      .all(self.db)
      .await?;
    self.summaries(paths).await
  }

  /// Path with its courses in order. Drafts are visible to admins only.
  pub async fn detail(
    &self,
    ctx: Option<&AuthContext>,
    id: &str,
  ) -> Result<PathDetail> {
    let path = self.by_id(id).await?;
    if !path.is_published && !ctx.is_some_and(AuthContext::is_admin) {
      return Err(Error::NotFound("Learning path"));
    }

    let courses = learning_path_course::Entity::find()
      .filter(learning_path_course::Column::PathId.eq(path.id.as_str()))
      .order_by_asc(learning_path_course::Column::Position)
      .find_also_related(course::Entity)
      .all(self.db)
      .await?
      .into_iter()
      .filter_map(|(_, course)| course)
      .collect();

    Ok(PathDetail { path, courses })
  }

  /// Paths the caller enrolled in, with progress summed over their courses.
  pub async fn my_paths(&self, ctx: &AuthContext) -> Result<Vec<EnrolledPath>> {
    let user = sv::User::new(self.db).current(ctx).await?;

    let enrolments = user_learning_path::Entity::find()
      .filter(user_learning_path::Column::UserId.eq(user.id.as_str()))
      .order_by_desc(user_learning_path::Column::EnrolledAt)
      .find_also_related(learning_path::Entity)
      .all(self.db)
      .await?;

    if enrolments.is_empty() {
      return Ok(Vec::new());
    }

    let completion: HashMap<String, CourseProgress> =
      sv::Progress::new(self.db)
        .course_completion(ctx)
        .await?
        .into_iter()
        .map(|c| (c.course_id, c.progress))
        .collect();

    let path_ids: Vec<String> =
      enrolments.iter().map(|(e, _)| e.path_id.clone()).collect();
    let links = learning_path_course::Entity::find()
      .filter(learning_path_course::Column::PathId.is_in(path_ids))
      .all(self.db)
      .await?;

    let mut totals: HashMap<String, (u64, u64)> = HashMap::new();
    for link in links {
      let entry = totals.entry(link.path_id).or_default();
      if let Some(progress) = completion.get(&link.course_id) {
        entry.0 += progress.completed;
        entry.1 += progress.total;
      }
    }

    Ok(
      enrolments
        .into_iter()
        .filter_map(|(enrolment, path)| {
          let (completed, total) =
            totals.get(&enrolment.path_id).copied().unwrap_or_default();
          Some(EnrolledPath {
            path: path?,
            enrolled_at: enrolment.enrolled_at,
            progress: CourseProgress::new(completed, total),
          })
        })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{CourseStatus, LessonType, user},
    sv::{
      progress,
      test_utils::{FakePayments, fixture, test_db},
    },
  };

  struct Catalog {
    db: DatabaseConnection,
    admin: AuthContext,
    tutor: user::Model,
  }

  impl Catalog {
    async fn new() -> Self {
      let db = test_db::setup().await;
      let admin = fixture::admin(&db).await;
      let tutor = fixture::tutor(&db).await;
      Self { admin: fixture::ctx(&admin), db, tutor }
    }

    async fn course(&self, status: CourseStatus) -> course::Model {
      fixture::course(&self.db, &self.tutor.id, "c", None, status).await
    }

    async fn path(&self) -> learning_path::Model {
      let input = PathInput { title: "Backend".into(), ..Default::default() };
      LearningPath::new(&self.db).create(&self.admin, input).await.unwrap()
    }
  }

  #[tokio::test]
  async fn test_publish_requires_course() {
    let c = Catalog::new().await;
    let sv = LearningPath::new(&c.db);
    let path = c.path().await;

    assert!(matches!(
      sv.set_published(&c.admin, &path.id, true).await,
      Err(Error::InvalidArgs(_))
    ));

    let course = c.course(CourseStatus::Published).await;
    sv.add_course(&c.admin, &path.id, &course.id).await.unwrap();

    let path = sv.set_published(&c.admin, &path.id, true).await.unwrap();
    assert!(path.is_published);

    let listed = sv.published_paths().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].course_count, 1);
  }

  #[tokio::test]
  async fn test_removing_last_course_unpublishes() {
    let c = Catalog::new().await;
    let sv = LearningPath::new(&c.db);
    let path = c.path().await;
    let first = c.course(CourseStatus::Published).await;
    let second = c.course(CourseStatus::Published).await;

    sv.add_course(&c.admin, &path.id, &first.id).await.unwrap();
    sv.add_course(&c.admin, &path.id, &second.id).await.unwrap();
    sv.set_published(&c.admin, &path.id, true).await.unwrap();

    sv.remove_course(&c.admin, &path.id, &first.id).await.unwrap();
    assert!(sv.by_id(&path.id).await.unwrap().is_published);

    sv.remove_course(&c.admin, &path.id, &second.id).await.unwrap();
    assert!(!sv.by_id(&path.id).await.unwrap().is_published);
    assert!(sv.published_paths().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_only_published_courses_join() {
    let c = Catalog::new().await;
    let sv = LearningPath::new(&c.db);
    let path = c.path().await;
    let draft = c.course(CourseStatus::Draft).await;
    let live = c.course(CourseStatus::Published).await;

    assert!(matches!(
      sv.add_course(&c.admin, &path.id, &draft.id).await,
      Err(Error::InvalidArgs(_))
    ));

    sv.add_course(&c.admin, &path.id, &live.id).await.unwrap();
    assert!(matches!(
      sv.add_course(&c.admin, &path.id, &live.id).await,
      Err(Error::Conflict(_))
    ));
  }

  #[tokio::test]
  async fn test_reorder_and_remove() {
    let c = Catalog::new().await;
    let sv = LearningPath::new(&c.db);
    let path = c.path().await;

    let mut ids = Vec::new();
    for _ in 0..3 {
      let course = c.course(CourseStatus::Published).await;
      sv.add_course(&c.admin, &path.id, &course.id).await.unwrap();
      ids.push(course.id);
    }

    let partial = vec![ids[0].clone(), ids[0].clone(), ids[1].clone()];
    assert!(matches!(
      sv.reorder_courses(&c.admin, &path.id, partial).await,
      Err(Error::InvalidArgs(_))
    ));

    let order = vec![ids[2].clone(), ids[0].clone(), ids[1].clone()];
    sv.reorder_courses(&c.admin, &path.id, order.clone()).await.unwrap();

    let detail = sv.detail(Some(&c.admin), &path.id).await.unwrap();
    let listed: Vec<String> = detail.courses.into_iter().map(|c| c.id).collect();
    assert_eq!(listed, order);

    sv.remove_course(&c.admin, &path.id, &ids[2]).await.unwrap();
    let positions: Vec<i32> = learning_path_course::Entity::find()
      .order_by_asc(learning_path_course::Column::Position)
      .all(&c.db)
      .await
      .unwrap()
      .into_iter()
      .map(|link| link.position)
      .collect();
    assert_eq!(positions, vec![1, 2]);
  }

  #[tokio::test]
  async fn test_unpublished_detail_is_hidden() {
    let c = Catalog::new().await;
    let path = c.path().await;
    let learner = fixture::learner(&c.db).await;
    let sv = LearningPath::new(&c.db);

    assert!(sv.detail(None, &path.id).await.is_err());
    assert!(sv.detail(Some(&fixture::ctx(&learner)), &path.id).await.is_err());
    assert!(sv.detail(Some(&c.admin), &path.id).await.is_ok());
  }

  #[tokio::test]
  async fn test_my_paths_aggregates_progress() {
    let c = Catalog::new().await;
    let sv = LearningPath::new(&c.db);
    let learner = fixture::learner(&c.db).await;
    let ctx = fixture::ctx(&learner);
    let path = c.path().await;

    let mut lessons = Vec::new();
    for _ in 0..2 {
      let course = c.course(CourseStatus::Published).await;
      let chapter = fixture::chapter(&c.db, &course.id, 1).await;
      lessons.push(fixture::lesson(&c.db, &chapter.id, 1, LessonType::Video).await);
      lessons.push(fixture::lesson(&c.db, &chapter.id, 2, LessonType::Video).await);
      sv.add_course(&c.admin, &path.id, &course.id).await.unwrap();
    }
    sv.set_published(&c.admin, &path.id, true).await.unwrap();

    sv::Checkout::new(&c.db, Arc::new(FakePayments::default()))
      .enroll_path(&ctx, &path.id, None)
      .await
      .unwrap();
    progress::upsert_completed(&c.db, &learner.id, &lessons[0].id).await.unwrap();

    let mine = sv.my_paths(&ctx).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].progress, CourseProgress::new(1, 4));
    assert_eq!(mine[0].progress.percentage, 25);
  }
}
