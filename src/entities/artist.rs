use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "artists")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub genres: Option<String>, // JSON array of genre tags: ["Jazz", "Folk", ...]
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,

    #[sea_orm(has_many)]
    pub shows: HasMany<super::show::Entity>,
    #[sea_orm(has_many)]
    pub availabilities: HasMany<super::availability::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
