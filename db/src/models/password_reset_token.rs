use chrono::{DateTime, Duration, Utc};
use rand::{Rng, thread_rng};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::NotSet, PaginatorTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};

/// A one-time numeric reset code.
///
/// A code is usable iff `used_at` is unset and `expires_at` lies in the
/// future. `used_at` is only ever written by [`Model::consume`].
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "password_reset_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Six random decimal digits, zero-padded.
pub fn generate_code() -> String {
    format!("{:06}", thread_rng().gen_range(0..1_000_000u32))
}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        code: &str,
        expiry_minutes: i64,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            code: Set(code.to_owned()),
            expires_at: Set(now + Duration::minutes(expiry_minutes)),
            used_at: Set(None),
            created_at: Set(now),
        }
        .insert(db)
        .await
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }

    /// Newest unused code matching `code` for the user. Expiry is checked by the
    /// caller against its own clock via [`Model::is_valid_at`].
    pub async fn find_unused<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        code: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::Code.eq(code))
            .filter(Column::UsedAt.is_null())
            .order_by_desc(Column::CreatedAt)
            .one(db)
            .await
    }

    /// How many codes were issued to the user since `since`.
    pub async fn count_issued_since<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::CreatedAt.gte(since))
            .count(db)
            .await
    }

    /// Marks the code used if it is still unused and unexpired at `now`.
    ///
    /// Check and write are one conditional `UPDATE`, so of two racing callers
    /// exactly one gets `true`.
    pub async fn consume<C: ConnectionTrait>(
        db: &C,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::UsedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::UsedAt.is_null())
            .filter(Column::ExpiresAt.gt(now))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }
}
