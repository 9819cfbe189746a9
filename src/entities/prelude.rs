pub use super::alternate_titles::Entity as AlternateTitles;
pub use super::categories::Entity as Categories;
pub use super::contacts::Entity as Contacts;
pub use super::daily_planning::Entity as DailyPlanning;
pub use super::episodes::Entity as Episodes;
pub use super::external_links::Entity as ExternalLinks;
pub use super::formats::Entity as Formats;
pub use super::license_types::Entity as LicenseTypes;
pub use super::origins::Entity as Origins;
pub use super::seasonal_planning::Entity as SeasonalPlanning;
pub use super::seasons::Entity as Seasons;
pub use super::staff_roles::Entity as StaffRoles;
pub use super::targets::Entity as Targets;
pub use super::title_categories::Entity as TitleCategories;
pub use super::title_distributors::Entity as TitleDistributors;
pub use super::title_staff::Entity as TitleStaff;
pub use super::title_studios::Entity as TitleStudios;
pub use super::titles::Entity as Titles;
