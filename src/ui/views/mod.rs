mod certificate;
mod login;
mod record_detail;
mod record_list;

pub use certificate::CertificateView;
pub use login::LoginView;
pub use record_detail::RecordDetailView;
pub use record_list::RecordListView;

use super::view::View;
use crate::records::{Notulen, SuratKeluar, SuratMasuk};
use crate::services::Services;

/// Root list view for a palette command, if it names one.
pub fn list_view(command: &str, services: &Services) -> Option<Box<dyn View>> {
  let view: Box<dyn View> = match command {
    "masuk" => Box::new(RecordListView::<SuratMasuk>::new(services.clone())),
    "keluar" => Box::new(RecordListView::<SuratKeluar>::new(services.clone())),
    "notulen" => Box::new(RecordListView::<Notulen>::new(services.clone())),
    _ => return None,
  };
  Some(view)
}
