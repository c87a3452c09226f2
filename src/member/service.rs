use crate::database::db::DB_NAME;
use crate::database::retry::with_read_retry;
use crate::member::model::{MemberRole, RoomMember};
use crate::realtime::model::ServerMessage;
use crate::realtime::server::{FanoutServer, RoomEvent};
use crate::utils::error::CustomError;
use actix::Addr;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::{
    Client, Collection,
    bson::{doc, oid::ObjectId, to_bson},
};

pub struct MemberService {
    members: Collection<RoomMember>,
    fanout: Addr<FanoutServer>,
}

impl MemberService {
    pub fn new(client: &Client, fanout: Addr<FanoutServer>) -> Self {
        let members = client
            .database(DB_NAME)
            .collection::<RoomMember>("room_members");
        MemberService { members, fanout }
    }

    pub async fn invite(
        &self,
        inviter_id: &str,
        room_id: &str,
        member_id: &str,
        role: MemberRole,
    ) -> Result<RoomMember, CustomError> {
        let existing = self
            .members
            .find_one(doc! { "room_id": room_id, "member_id": member_id })
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to check member: {}", e)))?;
        if existing.is_some() {
            return Err(CustomError::ValidationError(
                "User is already a member of this room".into(),
            ));
        }

        let member = RoomMember {
            id: ObjectId::new(),
            inviter_id: inviter_id.to_string(),
            room_id: room_id.to_string(),
            member_id: member_id.to_string(),
            role,
            joined_at: Utc::now(),
        };

        self.members
            .insert_one(&member)
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to add member: {}", e)))?;

        self.publish_member_list(room_id).await;
        Ok(member)
    }

    pub async fn members_in_room(&self, room_id: &str) -> Result<Vec<RoomMember>, CustomError> {
        with_read_retry(|| async move {
            self.members
                .find(doc! { "room_id": room_id })
                .sort(doc! { "joined_at": 1 })
                .await?
                .try_collect()
                .await
        })
        .await
    }

    pub async fn change_role(
        &self,
        room_id: &str,
        member_id: &str,
        role: MemberRole,
    ) -> Result<(), CustomError> {
        let role_bson = to_bson(&role).map_err(|e| {
            CustomError::InternalServerError(format!("Failed to encode role: {}", e))
        })?;

        let result = self
            .members
            .update_one(
                doc! { "room_id": room_id, "member_id": member_id },
                doc! { "$set": { "role": role_bson } },
            )
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to update role: {}", e)))?;

        if result.matched_count == 0 {
            return Err(CustomError::NotFoundError("Member not found".into()));
        }

        self.publish_member_list(room_id).await;
        Ok(())
    }

    pub async fn remove(&self, room_id: &str, member_id: &str) -> Result<(), CustomError> {
        let result = self
            .members
            .delete_one(doc! { "room_id": room_id, "member_id": member_id })
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to remove member: {}", e)))?;

        if result.deleted_count == 0 {
            return Err(CustomError::NotFoundError("Member not found".into()));
        }

        self.publish_member_list(room_id).await;
        Ok(())
    }

    async fn publish_member_list(&self, room_id: &str) {
        match self.members_in_room(room_id).await {
            Ok(members) => {
                self.fanout.do_send(RoomEvent {
                    room_id: room_id.to_string(),
                    message: ServerMessage::RoomMembersUpdated {
                        room_id: room_id.to_string(),
                        members,
                    },
                    exclude: None,
                });
            }
            Err(e) => log::warn!(
                "Failed to fetch members of room {} for broadcast: {}",
                room_id,
                e
            ),
        }
    }
}
