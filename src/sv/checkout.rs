use crate::{
  entity::{
    UserRole, course, learning_path, learning_path_course, payment_reference,
    purchase, user, user_learning_path,
  },
  prelude::*,
  sv::{
    self,
    paystack::{Payments, WebhookEvent},
  },
};

pub const CHARGE_SUCCESS: &str = "charge.success";

/// Owner, admin, free course or a recorded purchase.
pub async fn has_access<C: ConnectionTrait>(
  db: &C,
  user: &user::Model,
  course: &course::Model,
) -> Result<bool> {
  if course.is_owned_by(&user.id)
    || user.role == UserRole::Admin
    || course.is_free()
  {
    return Ok(true);
  }

  let purchased = purchase::Entity::find()
    .filter(purchase::Column::UserId.eq(user.id.as_str()))
    .filter(purchase::Column::CourseId.eq(course.id.as_str()))
    .count(db)
    .await?;

  Ok(purchased > 0)
}

/// Purchases the learner must be granted by a path enrolment.
async fn path_course_ids<C: ConnectionTrait>(
  db: &C,
  path_id: &str,
) -> Result<Vec<String>> {
  let ids = learning_path_course::Entity::find()
    .select_only()
    .column(learning_path_course::Column::CourseId)
    .filter(learning_path_course::Column::PathId.eq(path_id))
    .order_by_asc(learning_path_course::Column::Position)
    .into_tuple()
    .all(db)
    .await?;
  Ok(ids)
}

/// Provider references are short tokens; anything else never reaches the
/// payment API or the ledger.
pub fn clean_reference(reference: &str) -> Result<&str> {
  let reference = reference.trim();
  let valid = !reference.is_empty()
    && reference.len() <= 100
    && reference
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '='));

  if !valid {
    return Err(Error::InvalidArgs("Malformed payment reference".into()));
  }
  Ok(reference)
}

async fn insert_purchase<C: ConnectionTrait>(
  db: &C,
  user_id: &str,
  course_id: &str,
  reference: &str,
  amount: i64,
) -> Result<purchase::Model> {
  let purchase = purchase::ActiveModel {
    id: Set(utils::new_id()),
    user_id: Set(user_id.to_string()),
    course_id: Set(course_id.to_string()),
    payment_reference: Set(reference.to_string()),
    amount: Set(amount),
    created_at: Set(utils::now()),
  }
  .insert(db)
  .await?;

  info!("Recorded purchase of `{course_id}` by {user_id} ({reference})");
  Ok(purchase)
}

#[derive(Debug)]
pub enum WebhookOutcome {
  Ignored,
  Course(purchase::Model),
  Path(user_learning_path::Model),
}

pub struct Checkout<'a> {
  db: &'a DatabaseConnection,
  payments: Arc<dyn Payments>,
}

impl<'a> Checkout<'a> {
  pub fn new(db: &'a DatabaseConnection, payments: Arc<dyn Payments>) -> Self {
    Self { db, payments }
  }

  pub async fn has_access(
    &self,
    ctx: &AuthContext,
    course_id: &str,
  ) -> Result<bool> {
    let user = sv::User::new(self.db).current(ctx).await?;
    let course = sv::Course::new(self.db).by_id(course_id).await?;
    has_access(self.db, &user, &course).await
  }

  async fn purchasable(&self, course_id: &str) -> Result<course::Model> {
    let course = sv::Course::new(self.db).by_id(course_id).await?;
    if !course.is_published {
      return Err(Error::NotFound("Course"));
    }
    Ok(course)
  }

  async fn owned_purchase(
    &self,
    user_id: &str,
    course_id: &str,
  ) -> Result<Option<purchase::Model>> {
    let purchase = purchase::Entity::find()
      .filter(purchase::Column::UserId.eq(user_id))
      .filter(purchase::Column::CourseId.eq(course_id))
      .one(self.db)
      .await?;
    Ok(purchase)
  }

  async fn redeemed(
    &self,
    reference: &str,
  ) -> Result<Option<payment_reference::Model>> {
    let entry =
      payment_reference::Entity::find_by_id(reference).one(self.db).await?;
    Ok(entry)
  }

  /// Settled amount of a successful charge covering `price`.
  async fn verify_charge(&self, reference: &str, price: i64) -> Result<i64> {
    let verified = self.payments.verify(reference).await?;

    if verified.reference != reference {
      warn!(
        "Charge lookup for {reference} answered with {}",
        verified.reference
      );
      return Err(Error::Payment("Payment reference mismatch".into()));
    }
    if !verified.success {
      return Err(Error::Payment("Payment was not successful".into()));
    }
    if verified.amount < price {
      warn!("Underpaid charge {reference}: {} < {price}", verified.amount);
      return Err(Error::Payment("Paid amount does not cover the price".into()));
    }
    Ok(verified.amount)
  }

  async fn record_course(
    &self,
    user: &user::Model,
    course_id: &str,
    reference: &str,
  ) -> Result<purchase::Model> {
    let course = self.purchasable(course_id).await?;
    let reference = clean_reference(reference)?;

    if let Some(entry) = self.redeemed(reference).await? {
      let replayed = if entry.redeemed_for_course(&user.id, &course.id) {
        self.owned_purchase(&user.id, &course.id).await?
      } else {
        None
      };
      return replayed.ok_or_else(|| {
        Error::Conflict("Payment reference already used".into())
      });
    }
    if let Some(purchase) = self.owned_purchase(&user.id, &course.id).await? {
      return Ok(purchase);
    }
    if course.is_free() {
      return Err(Error::InvalidArgs("Course is free to enroll".into()));
    }

    let amount = self.verify_charge(reference, course.price.unwrap_or(0)).await?;

    // the ledger key rejects a racing second redemption
    let txn = self.db.begin().await?;
    payment_reference::ActiveModel {
      reference: Set(reference.to_string()),
      user_id: Set(user.id.clone()),
      course_id: Set(Some(course.id.clone())),
      path_id: Set(None),
      amount: Set(amount),
      created_at: Set(utils::now()),
    }
    .insert(&txn)
    .await?;
    let purchase =
      insert_purchase(&txn, &user.id, &course.id, reference, amount).await?;
    txn.commit().await?;

    Ok(purchase)
  }

  /// Exchanges a client-side payment reference for a purchase.
  pub async fn purchase_course(
    &self,
    ctx: &AuthContext,
    course_id: &str,
    reference: &str,
  ) -> Result<purchase::Model> {
    let user = sv::User::new(self.db).current(ctx).await?;
    self.record_course(&user, course_id, reference).await
  }

  pub async fn enroll_free(
    &self,
    ctx: &AuthContext,
    course_id: &str,
  ) -> Result<purchase::Model> {
    let user = sv::User::new(self.db).current(ctx).await?;
    let course = self.purchasable(course_id).await?;

    if !course.is_free() {
      return Err(Error::Payment("Course requires payment".into()));
    }
    if let Some(purchase) = self.owned_purchase(&user.id, &course.id).await? {
      return Ok(purchase);
    }

    let reference = format!("free:{}:{}", user.id, course.id);
    insert_purchase(self.db, &user.id, &course.id, &reference, 0).await
  }

  async fn record_path(
    &self,
    user: &user::Model,
    path_id: &str,
    reference: Option<&str>,
  ) -> Result<user_learning_path::Model> {
    let path = learning_path::Entity::find_by_id(path_id)
      .one(self.db)
      .await?
      .filter(|path| path.is_published)
      .ok_or(Error::NotFound("Learning path"))?;

    let key = (user.id.clone(), path.id.clone());
    if let Some(enrolment) =
      user_learning_path::Entity::find_by_id(key).one(self.db).await?
    {
      return Ok(enrolment);
    }

    let paid = if path.is_free() {
      None
    } else {
      let reference = reference
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(Error::Payment("Payment reference is required".into()))?;
      let reference = clean_reference(reference)?;

      if self.redeemed(reference).await?.is_some() {
        return Err(Error::Conflict("Payment reference already used".into()));
      }

      let amount =
        self.verify_charge(reference, path.price.unwrap_or(0)).await?;
      Some((reference.to_string(), amount))
    };

    let (reference, amount_paid) = match &paid {
      Some((reference, amount)) => (reference.clone(), *amount),
      None => (format!("free-path:{}:{}", user.id, path.id), 0),
    };

    let course_ids = path_course_ids(self.db, &path.id).await?;
    let owned: HashSet<String> = purchase::Entity::find()
      .select_only()
      .column(purchase::Column::CourseId)
      .filter(purchase::Column::UserId.eq(user.id.as_str()))
      .into_tuple::<String>()
      .all(self.db)
      .await?
      .into_iter()
      .collect();

    let now = utils::now();
    let txn = self.db.begin().await?;

    if paid.is_some() {
      payment_reference::ActiveModel {
        reference: Set(reference.clone()),
        user_id: Set(user.id.clone()),
        course_id: Set(None),
        path_id: Set(Some(path.id.clone())),
        amount: Set(amount_paid),
        created_at: Set(now),
      }
      .insert(&txn)
      .await?;
    }

    let enrolment = user_learning_path::ActiveModel {
      user_id: Set(user.id.clone()),
      path_id: Set(path.id.clone()),
      payment_reference: Set(Some(reference.clone())),
      amount_paid: Set(amount_paid),
      enrolled_at: Set(now),
    }
    .insert(&txn)
    .await?;

    for course_id in course_ids.iter().filter(|id| !owned.contains(*id)) {
      let grant = format!("{reference}:{course_id}");
      insert_purchase(&txn, &user.id, course_id, &grant, 0).await?;
    }

    txn.commit().await?;

    info!("User {} enrolled in path `{}`", user.id, path.id);
    Ok(enrolment)
  }

  /// Enrols the caller in a path, granting every course it bundles.
  pub async fn enroll_path(
    &self,
    ctx: &AuthContext,
    path_id: &str,
    reference: Option<&str>,
  ) -> Result<user_learning_path::Model> {
    let user = sv::User::new(self.db).current(ctx).await?;
    self.record_path(&user, path_id, reference).await
  }

  /// Replays a successful charge reported by the payment provider.
  pub async fn handle_webhook(
    &self,
    event: WebhookEvent,
  ) -> Result<WebhookOutcome> {
    if event.event != CHARGE_SUCCESS {
      debug!("Ignoring payment event `{}`", event.event);
      return Ok(WebhookOutcome::Ignored);
    }

    let charge = event.data;
    let Some(subject) = charge.metadata.user_id.as_deref() else {
      warn!("Charge {} carries no user", charge.reference);
      return Ok(WebhookOutcome::Ignored);
    };

    let users = sv::User::new(self.db);
    let user = match users.by_id(subject).await? {
      Some(user) => user,
      None => {
        users.by_clerk_id(subject).await?.ok_or(Error::NotFound("User"))?
      }
    };

    if let Some(course_id) = charge.metadata.course_id.as_deref() {
      let purchase =
        self.record_course(&user, course_id, &charge.reference).await?;
      return Ok(WebhookOutcome::Course(purchase));
    }
    if let Some(path_id) = charge.metadata.path_id.as_deref() {
      let enrolment =
        self.record_path(&user, path_id, Some(&charge.reference)).await?;
      return Ok(WebhookOutcome::Path(enrolment));
    }

    Ok(WebhookOutcome::Ignored)
  }

  /// Courses the caller has bought or been granted, newest first.
  pub async fn purchased_courses(
    &self,
    ctx: &AuthContext,
  ) -> Result<Vec<course::Model>> {
    let user = sv::User::new(self.db).current(ctx).await?;

    let courses = purchase::Entity::find()
      .filter(purchase::Column::UserId.eq(user.id))
      .order_by_desc(purchase::Column::CreatedAt)
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
    sv::{
      paystack::{ChargeMetadata, WebhookCharge},
      test_utils::{FakePayments, fixture, test_db},
    },
  };

  struct Shop {
    db: DatabaseConnection,
    payments: Arc<FakePayments>,
    tutor: user::Model,
    learner: user::Model,
  }

  impl Shop {
    async fn new() -> Self {
      let db = test_db::setup().await;
      let tutor = fixture::tutor(&db).await;
      let learner = fixture::learner(&db).await;
      Self { db, payments: Arc::new(FakePayments::default()), tutor, learner }
    }

    fn checkout(&self) -> Checkout<'_> {
      Checkout::new(&self.db, self.payments.clone())
    }

    async fn course(&self, price: Option<i64>) -> course::Model {
      fixture::course(&self.db, &self.tutor.id, "c", price, CourseStatus::Published)
        .await
    }
  }

  #[tokio::test]
  async fn test_purchase_and_replay() {
    let shop = Shop::new().await;
    let course = shop.course(Some(5000)).await;
    let ctx = fixture::ctx(&shop.learner);
    shop.payments.charge("ref_1", 5000, true);

    let first =
      shop.checkout().purchase_course(&ctx, &course.id, "ref_1").await.unwrap();
    let again =
      shop.checkout().purchase_course(&ctx, &course.id, "ref_1").await.unwrap();

    assert_eq!(first.id, again.id);
    assert_eq!(first.amount, 5000);
    assert!(shop.checkout().has_access(&ctx, &course.id).await.unwrap());
    assert_eq!(purchase::Entity::find().count(&shop.db).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_reference_cannot_be_reused() {
    let shop = Shop::new().await;
    let course = shop.course(Some(5000)).await;
    let other = fixture::learner(&shop.db).await;
    shop.payments.charge("ref_1", 5000, true);

    shop
      .checkout()
      .purchase_course(&fixture::ctx(&shop.learner), &course.id, "ref_1")
      .await
      .unwrap();
    let result = shop
      .checkout()
      .purchase_course(&fixture::ctx(&other), &course.id, "ref_1")
      .await;

    assert!(matches!(result, Err(Error::Conflict(_))));
  }

  #[tokio::test]
  async fn test_bad_payments_are_refused() {
    let shop = Shop::new().await;
    let course = shop.course(Some(5000)).await;
    let ctx = fixture::ctx(&shop.learner);
    shop.payments.charge("short", 4999, true);
    shop.payments.charge("failed", 5000, false);

    for reference in ["short", "failed", "unknown"] {
      let result =
        shop.checkout().purchase_course(&ctx, &course.id, reference).await;
      assert!(matches!(result, Err(Error::Payment(_))), "{reference}");
    }
    assert!(!shop.checkout().has_access(&ctx, &course.id).await.unwrap());
  }

  #[tokio::test]
  async fn test_free_enrolment() {
    let shop = Shop::new().await;
    let free = shop.course(None).await;
    let paid = shop.course(Some(100)).await;
    let ctx = fixture::ctx(&shop.learner);

    let purchase = shop.checkout().enroll_free(&ctx, &free.id).await.unwrap();
    assert_eq!(
      purchase.payment_reference,
      format!("free:{}:{}", shop.learner.id, free.id)
    );
    shop.checkout().enroll_free(&ctx, &free.id).await.unwrap();

    assert!(matches!(
      shop.checkout().enroll_free(&ctx, &paid.id).await,
      Err(Error::Payment(_))
    ));
  }

  #[tokio::test]
  async fn test_access_rules() {
    let shop = Shop::new().await;
    let admin = fixture::admin(&shop.db).await;
    let paid = shop.course(Some(100)).await;
    let free = shop.course(Some(0)).await;

    assert!(has_access(&shop.db, &shop.tutor, &paid).await.unwrap());
    assert!(has_access(&shop.db, &admin, &paid).await.unwrap());
    assert!(has_access(&shop.db, &shop.learner, &free).await.unwrap());
    assert!(!has_access(&shop.db, &shop.learner, &paid).await.unwrap());

    fixture::purchase(&shop.db, &shop.learner.id, &paid.id, 100).await;
    assert!(has_access(&shop.db, &shop.learner, &paid).await.unwrap());
  }

  async fn path(
    db: &DatabaseConnection,
    price: Option<i64>,
    courses: &[&course::Model],
  ) -> learning_path::Model {
    let now = utils::now();
    let path = learning_path::ActiveModel {
      id: Set(utils::new_id()),
      title: Set("Backend".into()),
      description: Set(None),
      image_url: Set(None),
      price: Set(price),
      is_published: Set(true),
      created_by: Set(None),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap();

    for (index, course) in courses.iter().enumerate() {
      learning_path_course::ActiveModel {
        path_id: Set(path.id.clone()),
        course_id: Set(course.id.clone()),
        position: Set(index as i32 + 1),
      }
      .insert(db)
      .await
      .unwrap();
    }
    path
  }

  #[tokio::test]
  async fn test_path_grants_missing_courses() {
    let shop = Shop::new().await;
    let a = shop.course(Some(100)).await;
    let b = shop.course(Some(200)).await;
    fixture::purchase(&shop.db, &shop.learner.id, &a.id, 100).await;
    let path = path(&shop.db, Some(250), &[&a, &b]).await;
    let ctx = fixture::ctx(&shop.learner);
    shop.payments.charge("path_ref", 250, true);

    let enrolment = shop
      .checkout()
      .enroll_path(&ctx, &path.id, Some("path_ref"))
      .await
      .unwrap();
    assert_eq!(enrolment.amount_paid, 250);

    let granted = purchase::Entity::find()
      .filter(purchase::Column::PaymentReference.eq(format!("path_ref:{}", b.id)))
      .one(&shop.db)
      .await
      .unwrap();
    assert!(granted.is_some());
    assert_eq!(purchase::Entity::find().count(&shop.db).await.unwrap(), 2);

    // enrolling twice is a no-op
    shop.checkout().enroll_path(&ctx, &path.id, None).await.unwrap();
    assert_eq!(purchase::Entity::find().count(&shop.db).await.unwrap(), 2);
  }

  #[tokio::test]
  async fn test_paid_path_needs_reference() {
    let shop = Shop::new().await;
    let a = shop.course(Some(100)).await;
    let path = path(&shop.db, Some(100), &[&a]).await;

    let result = shop
      .checkout()
      .enroll_path(&fixture::ctx(&shop.learner), &path.id, None)
      .await;
    assert!(matches!(result, Err(Error::Payment(_))));
  }

  #[tokio::test]
  async fn test_reference_redeems_one_grant() {
    let shop = Shop::new().await;
    let ctx = fixture::ctx(&shop.learner);
    let a = shop.course(Some(100)).await;
    let b = shop.course(Some(200)).await;
    let bundle = path(&shop.db, Some(250), &[&a]).await;
    shop.payments.charge("R", 250, true);

    shop.checkout().enroll_path(&ctx, &bundle.id, Some("R")).await.unwrap();
    assert!(matches!(
      shop.checkout().purchase_course(&ctx, &b.id, "R").await,
      Err(Error::Conflict(_))
    ));
    assert!(!shop.checkout().has_access(&ctx, &b.id).await.unwrap());

    let d = shop.course(Some(100)).await;
    let other = path(&shop.db, Some(100), &[&b]).await;
    shop.payments.charge("S", 100, true);

    shop.checkout().purchase_course(&ctx, &d.id, "S").await.unwrap();
    assert!(matches!(
      shop.checkout().enroll_path(&ctx, &other.id, Some("S")).await,
      Err(Error::Conflict(_))
    ));
    assert!(!shop.checkout().has_access(&ctx, &b.id).await.unwrap());
    assert_eq!(payment_reference::Entity::find().count(&shop.db).await.unwrap(), 2);
  }

  #[tokio::test]
  async fn test_reference_must_name_the_settled_charge() {
    let shop = Shop::new().await;
    let course = shop.course(Some(5000)).await;
    let ctx = fixture::ctx(&shop.learner);
    shop.payments.charge_as("R2", "R", 5000);

    assert!(matches!(
      shop.checkout().purchase_course(&ctx, &course.id, "R2").await,
      Err(Error::Payment(_))
    ));
    for reference in ["R?x=1", "R/../x", "", "R:c1"] {
      let result = shop.checkout().purchase_course(&ctx, &course.id, reference).await;
      assert!(matches!(result, Err(Error::InvalidArgs(_))), "{reference}");
    }
    assert!(!shop.checkout().has_access(&ctx, &course.id).await.unwrap());
  }

  #[test]
  fn test_clean_reference() {
    assert_eq!(clean_reference("  T123_abc.x=  ").unwrap(), "T123_abc.x=");
    assert!(clean_reference(&"a".repeat(101)).is_err());
    assert!(clean_reference("a b").is_err());
  }

  #[tokio::test]
  async fn test_webhook_records_purchase() {
    let shop = Shop::new().await;
    let course = shop.course(Some(300)).await;
    shop.payments.charge("hook_ref", 300, true);

    let event = WebhookEvent {
      event: CHARGE_SUCCESS.into(),
      data: WebhookCharge {
        reference: "hook_ref".into(),
        metadata: ChargeMetadata {
          user_id: Some(shop.learner.clerk_id.clone()),
          course_id: Some(course.id.clone()),
          path_id: None,
        },
      },
    };

    let outcome = shop.checkout().handle_webhook(event).await.unwrap();
    assert!(matches!(outcome, WebhookOutcome::Course(p) if p.course_id == course.id));

    let ignored = WebhookEvent {
      event: "transfer.success".into(),
      data: WebhookCharge {
        reference: "x".into(),
        metadata: ChargeMetadata::default(),
      },
    };
    assert!(matches!(
      shop.checkout().handle_webhook(ignored).await.unwrap(),
      WebhookOutcome::Ignored
    ));
  }
}
