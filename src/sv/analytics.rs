use sea_orm::{JoinType, RelationTrait};
use serde::Serialize;

use crate::{
  entity::{CourseStatus, UserRole, UserStatus, course, purchase, review, user},
  prelude::*,
  sv::{self, engagement},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
  pub draft: u64,
  pub pending: u64,
  pub published: u64,
  pub rejected: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorDashboard {
  pub courses: StatusCounts,
  pub enrollments: u64,
  /// Minor currency units
  pub revenue: i64,
  pub average_rating: Option<f64>,
  pub review_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
  pub learners: u64,
  pub tutors: u64,
  pub admins: u64,
  pub pending_tutors: u64,
  pub courses: StatusCounts,
  pub enrollments: u64,
  pub total_revenue: i64,
}

pub struct Analytics<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Analytics<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn status_counts(&self, tutor_id: Option<&str>) -> Result<StatusCounts> {
    let count = |status: CourseStatus| {
      let mut select =
        course::Entity::find().filter(course::Column::Status.eq(status));
      if let Some(tutor_id) = tutor_id {
        select = select.filter(course::Column::TutorId.eq(tutor_id));
      }
      select.count(self.db)
    };

    let (draft, pending, published, rejected) = futures::try_join!(
      count(CourseStatus::Draft),
      count(CourseStatus::Pending),
      count(CourseStatus::Published),
      count(CourseStatus::Rejected),
    )?;

    Ok(StatusCounts { draft, pending, published, rejected })
  }

  /// Purchase count and amount sum, optionally for one tutor's courses.
  async fn sales(&self, tutor_id: Option<&str>) -> Result<(u64, i64)> {
    let mut select = purchase::Entity::find().inner_join(course::Entity);
    if let Some(tutor_id) = tutor_id {
      select = select.filter(course::Column::TutorId.eq(tutor_id));
    }

    let (count, revenue) = futures::try_join!(
      select.clone().count(self.db),
      select
        .select_only()
        .column_as(purchase::Column::Amount.sum(), "revenue")
        .into_tuple::<Option<i64>>()
        .one(self.db),
    )?;

    Ok((count, revenue.flatten().unwrap_or_default()))
  }

  pub async fn tutor_dashboard(
    &self,
    ctx: &AuthContext,
  ) -> Result<TutorDashboard> {
    let tutor = sv::User::new(self.db).active_tutor(ctx).await?;

    let ratings = review::Entity::find()
      .select_only()
      .column(review::Column::Rating)
      .join(JoinType::InnerJoin, review::Relation::Course.def())
      .filter(course::Column::TutorId.eq(tutor.id.as_str()))
      .into_tuple::<i32>()
      .all(self.db);

    let (courses, (enrollments, revenue), ratings) = futures::try_join!(
      self.status_counts(Some(tutor.id.as_str())),
      self.sales(Some(tutor.id.as_str())),
      async { ratings.await.map_err(Error::from) },
    )?;

    Ok(TutorDashboard {
      courses,
      enrollments,
      revenue,
      average_rating: engagement::average(&ratings),
      review_count: ratings.len() as u64,
    })
  }

  pub async fn admin_overview(&self, ctx: &AuthContext) -> Result<AdminOverview> {
    ctx.require_admin()?;
    let users = sv::User::new(self.db);

    let pending_tutors = user::Entity::find()
      .filter(user::Column::Role.eq(UserRole::Tutor))
      .filter(user::Column::Status.eq(UserStatus::Pending))
      .count(self.db);

    let (learners, tutors, admins, pending_tutors) = futures::try_join!(
      users.count_by_role(UserRole::Learner),
      users.count_by_role(UserRole::Tutor),
      users.count_by_role(UserRole::Admin),
      async { pending_tutors.await.map_err(Error::from) },
    )?;
    let (courses, (enrollments, total_revenue)) =
      futures::try_join!(self.status_counts(None), self.sales(None))?;

    Ok(AdminOverview {
      learners,
      tutors,
      admins,
      pending_tutors,
      courses,
      enrollments,
      total_revenue,
    })
  }
}
