use sea_orm::sea_query::OnConflict;

use crate::{
  entity::{LessonType, lesson, mux_data},
  prelude::*,
  sv::{
    self,
    mux::{self, Upload, VideoHost},
  },
};

pub struct Video<'a> {
  db: &'a DatabaseConnection,
  host: Arc<dyn VideoHost>,
  attempts: u32,
  interval: Duration,
}

impl<'a> Video<'a> {
  pub fn new(
    db: &'a DatabaseConnection,
    host: Arc<dyn VideoHost>,
    attempts: u32,
    interval: Duration,
  ) -> Self {
    Self { db, host, attempts, interval }
  }

  async fn video_lesson(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
  ) -> Result<lesson::Model> {
    let lesson =
      sv::Content::new(self.db).owned_lesson(ctx, lesson_id).await?;
    if lesson.lesson_type != LessonType::Video {
      return Err(Error::InvalidArgs("Only video lessons take uploads".into()));
    }
    Ok(lesson)
  }

  /// Starts a direct upload; a new upload replaces any previous asset.
  pub async fn create_upload(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
  ) -> Result<Upload> {
    let lesson = self.video_lesson(ctx, lesson_id).await?;
    let upload = self.host.create_upload(&lesson.id).await?;

    let row = mux_data::ActiveModel {
      lesson_id: Set(lesson.id.clone()),
      upload_id: Set(Some(upload.id.clone())),
      asset_id: Set(None),
      playback_id: Set(None),
      updated_at: Set(utils::now()),
    };
    mux_data::Entity::insert(row)
      .on_conflict(
        OnConflict::column(mux_data::Column::LessonId)
          .update_columns([
            mux_data::Column::UploadId,
            mux_data::Column::AssetId,
            mux_data::Column::PlaybackId,
            mux_data::Column::UpdatedAt,
          ])
          .to_owned(),
      )
      .exec_without_returning(self.db)
      .await?;

    info!(lesson = %lesson.id, upload = %upload.id, "video upload created");
    Ok(upload)
  }

  /// Polls the host until the uploaded asset is playable, then points the
  /// lesson at its stream.
  pub async fn await_playback(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
  ) -> Result<mux_data::Model> {
    let lesson = self.video_lesson(ctx, lesson_id).await?;
    let mut data = mux_data::Entity::find_by_id(lesson.id.as_str())
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Upload"))?;
    let upload_id =
      data.upload_id.clone().ok_or(Error::NotFound("Upload"))?;

    for attempt in 1..=self.attempts {
      if attempt > 1 {
        tokio::time::sleep(self.interval).await;
      }

      let asset_id = match data.asset_id.clone() {
        Some(id) => id,
        None => match self.host.upload_asset(&upload_id).await? {
          Some(id) => {
            data = mux_data::ActiveModel {
              asset_id: Set(Some(id.clone())),
              updated_at: Set(utils::now()),
              ..data.into()
            }
            .update(self.db)
            .await?;
            id
          }
          None => continue,
        },
      };

      let asset = self.host.asset(&asset_id).await?;
      match (asset.status.as_str(), asset.playback_id) {
        ("ready", Some(playback_id)) => {
          return self.store_playback(lesson, data, playback_id).await;
        }
        ("errored", _) => {
          return Err(Error::External(format!("Asset {asset_id} errored")));
        }
        (status, _) => debug!(attempt, status, "video asset not ready"),
      }
    }

    Err(Error::External("Video is still processing".into()))
  }

  async fn store_playback(
    &self,
    lesson: lesson::Model,
    data: mux_data::Model,
    playback_id: String,
  ) -> Result<mux_data::Model> {
    let txn = self.db.begin().await?;

    lesson::ActiveModel {
      video_url: Set(Some(mux::stream_url(&playback_id))),
      ..lesson.into()
    }
    .update(&txn)
    .await?;

    let data = mux_data::ActiveModel {
      playback_id: Set(Some(playback_id)),
      updated_at: Set(utils::now()),
      ..data.into()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;
    Ok(data)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicU32;

  use super::*;
  use crate::{
    entity::CourseStatus,
    sv::test_utils::{FakeVideo, fixture, test_db},
  };

  fn video(
    db: &DatabaseConnection,
    ready_after: u32,
    attempts: u32,
  ) -> Video<'_> {
    let host = Arc::new(FakeVideo { ready_after, polls: AtomicU32::new(0) });
    Video::new(db, host, attempts, Duration::from_millis(1))
  }

  async fn make_lesson(
    db: &DatabaseConnection,
    tutor_id: &str,
    lesson_type: LessonType,
  ) -> lesson::Model {
    let course =
      fixture::course(db, tutor_id, "c", None, CourseStatus::Draft).await;
    let chapter = fixture::chapter(db, &course.id, 1).await;
    fixture::lesson(db, &chapter.id, 1, lesson_type).await
  }

  #[tokio::test]
  async fn test_upload_then_playback() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let ctx = fixture::ctx(&tutor);
    let lesson = make_lesson(&db, &tutor.id, LessonType::Video).await;
    let sv = video(&db, 3, 5);

    let upload = sv.create_upload(&ctx, &lesson.id).await.unwrap();
    assert_eq!(upload.id, format!("upload_{}", lesson.id));

    let data = sv.await_playback(&ctx, &lesson.id).await.unwrap();
    assert_eq!(data.asset_id.as_deref(), Some("asset_1"));
    assert_eq!(data.playback_id.as_deref(), Some("pb_1"));

    let lesson = lesson::Entity::find_by_id(lesson.id).one(&db).await.unwrap();
    assert_eq!(
      lesson.unwrap().video_url,
      Some("https://stream.mux.com/pb_1.m3u8".into())
    );
  }

  #[tokio::test]
  async fn test_gives_up_after_attempts() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let ctx = fixture::ctx(&tutor);
    let lesson = make_lesson(&db, &tutor.id, LessonType::Video).await;
    let sv = video(&db, 10, 2);

    sv.create_upload(&ctx, &lesson.id).await.unwrap();
    assert!(matches!(
      sv.await_playback(&ctx, &lesson.id).await,
      Err(Error::External(_))
    ));
  }

  #[tokio::test]
  async fn test_rejects_quiz_and_foreign_lessons() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let other = fixture::tutor(&db).await;
    let quiz = make_lesson(&db, &tutor.id, LessonType::Quiz).await;
    let foreign = make_lesson(&db, &other.id, LessonType::Video).await;
    let fresh = make_lesson(&db, &tutor.id, LessonType::Video).await;
    let sv = video(&db, 1, 1);
    let ctx = fixture::ctx(&tutor);

    assert!(matches!(
      sv.create_upload(&ctx, &quiz.id).await,
      Err(Error::InvalidArgs(_))
    ));
    assert!(sv.create_upload(&ctx, &foreign.id).await.is_err());
    assert!(matches!(
      sv.await_playback(&ctx, &fresh.id).await,
      Err(Error::NotFound("Upload"))
    ));
  }
}
