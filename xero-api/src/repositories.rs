use crate::endpoints::connections::ListConnections;

pub struct ConnectionRepository;

impl ConnectionRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn list(&self) -> ListConnections {
        ListConnections::default()
    }
}
