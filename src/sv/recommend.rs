use sea_orm::sea_query::{Expr, Func};

use crate::{
  entity::{course, purchase},
  prelude::*,
  sv,
  utils::MAX_PAGE_LIMIT,
};

pub struct Recommend<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Recommend<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn enrollments(&self) -> Result<HashMap<String, i64>> {
    let counts = purchase::Entity::find()
      .select_only()
      .column(purchase::Column::CourseId)
      .column_as(purchase::Column::Id.count(), "total")
      .group_by(purchase::Column::CourseId)
      .into_tuple::<(String, i64)>()
      .all(self.db)
      .await?;
    Ok(counts.into_iter().collect())
  }

  /// Most enrolled first, newest breaking ties.
  fn rank(
    mut courses: Vec<course::Model>,
    enrollments: &HashMap<String, i64>,
    limit: usize,
  ) -> Vec<course::Model> {
    courses.sort_by(|a, b| {
      let count = |c: &course::Model| {
        enrollments.get(&c.id).copied().unwrap_or_default()
      };
      count(b).cmp(&count(a)).then(b.created_at.cmp(&a.created_at))
    });
    courses.truncate(limit);
    courses
  }

  async fn published_except(
    &self,
    exclude: &HashSet<String>,
    categories: Option<&[String]>,
  ) -> Result<Vec<course::Model>> {
    let mut select =
      course::Entity::find().filter(course::Column::IsPublished.eq(true));
    if !exclude.is_empty() {
      select = select
        .filter(course::Column::Id.is_not_in(exclude.iter().cloned()));
    }
    if let Some(categories) = categories {
      select = select.filter(
        Expr::expr(Func::lower(Expr::col(course::Column::Category)))
          .is_in(categories.iter().cloned()),
      );
    }
    Ok(select.all(self.db).await?)
  }

  pub async fn popular(&self, limit: u64) -> Result<Vec<course::Model>> {
    let limit = limit.clamp(1, MAX_PAGE_LIMIT) as usize;
    let none = HashSet::new();
    let (courses, enrollments) = futures::try_join!(
      self.published_except(&none, None),
      self.enrollments(),
    )?;
    Ok(Self::rank(courses, &enrollments, limit))
  }

  /// Courses in the learner's interest categories they do not own yet.
  pub async fn for_user(
    &self,
    ctx: &AuthContext,
    limit: u64,
  ) -> Result<Vec<course::Model>> {
    let limit = limit.clamp(1, MAX_PAGE_LIMIT) as usize;
    let user = sv::User::new(self.db).current(ctx).await?;

    let mut owned: HashSet<String> = purchase::Entity::find()
      .select_only()
      .column(purchase::Column::CourseId)
      .filter(purchase::Column::UserId.eq(user.id.as_str()))
      .into_tuple::<String>()
      .all(self.db)
      .await?
      .into_iter()
      .collect();
    owned.extend(
      course::Entity::find()
        .select_only()
        .column(course::Column::Id)
        .filter(course::Column::TutorId.eq(user.id.as_str()))
        .into_tuple::<String>()
        .all(self.db)
        .await?,
    );

    let enrollments = self.enrollments().await?;
    let interests = user.interests();

    if !interests.is_empty() {
      let matching =
        self.published_except(&owned, Some(interests.as_slice())).await?;
      if !matching.is_empty() {
        return Ok(Self::rank(matching, &enrollments, limit));
      }
    }

    debug!(user = %user.id, "no interest match, recommending popular courses");
    let fallback = self.published_except(&owned, None).await?;
    Ok(Self::rank(fallback, &enrollments, limit))
  }
}
