use sea_orm::{
  Condition, Select,
  sea_query::{Expr, Func},
};
use serde::Deserialize;

use crate::{
  entity::{CourseStatus, UserRole, course, user},
  prelude::*,
  sv,
  utils::{Page, PageQuery},
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
  pub title: String,
  pub description: Option<String>,
  pub image_url: Option<String>,
  pub category: Option<String>,
  pub price: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub image_url: Option<String>,
  pub category: Option<String>,
  pub price: Option<i64>,
}

fn validate_title(title: &str) -> Result<String> {
  let title = title.trim();
  if title.is_empty() {
    return Err(Error::InvalidArgs("Title is required".into()));
  }
  Ok(title.to_string())
}

fn validate_price(price: Option<i64>) -> Result<Option<i64>> {
  match price {
    Some(price) if price < 0 => {
      Err(Error::InvalidArgs("Price cannot be negative".into()))
    }
    price => Ok(price),
  }
}

/// Case-insensitive search over title and description plus category.
fn catalog_filter(query: &PageQuery) -> Condition {
  let mut cond = Condition::all();

  if let Some(pattern) = query.search_pattern() {
    let lower = |col: course::Column| Expr::expr(Func::lower(Expr::col(col)));
    cond = cond.add(
      Condition::any()
        .add(lower(course::Column::Title).like(pattern.clone()))
        .add(lower(course::Column::Description).like(pattern)),
    );
  }

  if let Some(category) =
    query.category.as_deref().map(str::trim).filter(|c| !c.is_empty())
  {
    cond = cond.add(course::Column::Category.eq(category));
  }

  cond
}

pub struct Course<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Course<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_id(&self, id: &str) -> Result<course::Model> {
    course::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Course"))
  }

  /// Course the caller may edit, together with the caller's row.
  pub async fn owned(
    &self,
    ctx: &AuthContext,
    id: &str,
  ) -> Result<(user::Model, course::Model)> {
    let tutor = sv::User::new(self.db).active_tutor(ctx).await?;
    let course = self.by_id(id).await?;

    if !course.is_owned_by(&tutor.id) {
      return Err(Error::Forbidden);
    }
    Ok((tutor, course))
  }

  pub async fn create(
    &self,
    ctx: &AuthContext,
    input: CourseInput,
  ) -> Result<course::Model> {
    let tutor = sv::User::new(self.db).active_tutor(ctx).await?;
    let now = utils::now();

    let course = course::ActiveModel {
      id: Set(utils::new_id()),
      tutor_id: Set(Some(tutor.id)),
      title: Set(validate_title(&input.title)?),
      description: Set(input.description),
      image_url: Set(input.image_url),
      category: Set(input.category),
      price: Set(validate_price(input.price)?),
      status: Set(CourseStatus::Draft),
      is_published: Set(false),
      rejection_reason: Set(None),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(self.db)
    .await?;

    info!("Course `{}` created as draft", course.id);
    Ok(course)
  }

  pub async fn update(
    &self,
    ctx: &AuthContext,
    id: &str,
    patch: CoursePatch,
  ) -> Result<course::Model> {
    let (_, course) = self.owned(ctx, id).await?;
    let mut model: course::ActiveModel = course.into();

    if let Some(title) = patch.title {
      model.title = Set(validate_title(&title)?);
    }
    if let Some(description) = patch.description {
      model.description = Set(Some(description));
    }
    if let Some(image_url) = patch.image_url {
      model.image_url = Set(Some(image_url));
    }
    if let Some(category) = patch.category {
      model.category = Set(Some(category));
    }
    if patch.price.is_some() {
      model.price = Set(validate_price(patch.price)?);
    }
    model.updated_at = Set(utils::now());

    Ok(model.update(self.db).await?)
  }

  /// Owners and admins may delete; children cascade.
  pub async fn delete(&self, ctx: &AuthContext, id: &str) -> Result<()> {
    let course = self.by_id(id).await?;

    if !ctx.is_admin() {
      let tutor = sv::User::new(self.db).active_tutor(ctx).await?;
      if !course.is_owned_by(&tutor.id) {
        return Err(Error::Forbidden);
      }
    }

    course::Entity::delete_by_id(course.id).exec(self.db).await?;
    Ok(())
  }

  /// DRAFT or REJECTED -> PENDING, owner only.
  pub async fn submit_for_review(
    &self,
    ctx: &AuthContext,
    id: &str,
  ) -> Result<course::Model> {
    let (_, course) = self.owned(ctx, id).await?;

    if !matches!(course.status, CourseStatus::Draft | CourseStatus::Rejected) {
      return Err(Error::transition(course.status, CourseStatus::Pending));
    }

    let course = course::ActiveModel {
      status: Set(CourseStatus::Pending),
      is_published: Set(false),
      updated_at: Set(utils::now()),
      ..course.into()
    }
    .update(self.db)
    .await?;

    info!("Course `{}` submitted for review", course.id);
    Ok(course)
  }

  async fn paginate(
    &self,
    select: Select<course::Entity>,
    query: &PageQuery,
  ) -> Result<Page<course::Model>> {
    let select = select.filter(catalog_filter(query));

    let (total, items) = futures::try_join!(
      select.clone().count(self.db),
      select
        .order_by_desc(course::Column::CreatedAt)
        .order_by_asc(course::Column::Id)
        .offset(query.offset())
        .limit(query.limit())
        .all(self.db),
    )?;

    Ok(Page::new(items, total, query))
  }

  /// Every course of the calling tutor, any status.
  pub async fn tutor_courses(
    &self,
    ctx: &AuthContext,
    query: &PageQuery,
  ) -> Result<Page<course::Model>> {
    ctx.require_tutor()?;
    let tutor = sv::User::new(self.db).current(ctx).await?;

    let select =
      course::Entity::find().filter(course::Column::TutorId.eq(tutor.id));
    self.paginate(select, query).await
  }

  /// Admin view over the whole catalog.
  pub async fn all_courses(
    &self,
    ctx: &AuthContext,
    query: &PageQuery,
  ) -> Result<Page<course::Model>> {
    ctx.require_admin()?;
    self.paginate(course::Entity::find(), query).await
  }

  pub async fn marketplace_courses(
    &self,
    query: &PageQuery,
  ) -> Result<Page<course::Model>> {
    let select =
      course::Entity::find().filter(course::Column::IsPublished.eq(true));
    self.paginate(select, query).await
  }

  /// Course page: published courses for everyone, drafts for the owner and
  /// admins.
  pub async fn visible(
    &self,
    ctx: Option<&AuthContext>,
    id: &str,
  ) -> Result<course::Model> {
    let course = self.by_id(id).await?;
    if course.is_published {
      return Ok(course);
    }

    let Some(ctx) = ctx else {
      return Err(Error::NotFound("Course"));
    };
    if ctx.role == UserRole::Admin {
      return Ok(course);
    }

    let user = sv::User::new(self.db).current(ctx).await?;
    if course.is_owned_by(&user.id) {
      Ok(course)
    } else {
      Err(Error::NotFound("Course"))
    }
  }

  pub async fn count_by_status(&self, status: CourseStatus) -> Result<u64> {
    let count = course::Entity::find()
      .filter(course::Column::Status.eq(status))
      .count(self.db)
      .await?;
    Ok(count)
  }
}
