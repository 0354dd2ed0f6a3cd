//! Member service endpoints: follow graph and profile management.

use crate::error::ClientError;
use crate::http::{HttpClient, RequestSpec};
use dailyfeed_core::types::{
    ApiEnvelope, AuthUser, FollowersFollowings, FollowingMember, Page, ProfileData,
    RecommendedMember,
};
use serde_json::json;

impl HttpClient {
    /// Members suggested for the "who to follow" panel.
    pub async fn recommended_members(
        &self,
        size: u32,
    ) -> Result<Page<RecommendedMember>, ClientError> {
        let url = format!(
            "{}/api/members/follow/recommend/newbie?size={size}",
            self.services().member
        );
        let envelope: ApiEnvelope<Page<RecommendedMember>> =
            self.execute_json(RequestSpec::get(url)).await?;

        let mut page = envelope.data;
        for member in &mut page.content {
            if member.handle.is_none() {
                member.handle = Some(member.member_name.clone());
            }
        }
        Ok(page)
    }

    pub async fn follow(&self, member_id: i64) -> Result<(), ClientError> {
        let url = format!("{}/api/members/follow", self.services().member);
        self.execute_value(RequestSpec::post_json(
            url,
            json!({"memberIdToFollow": member_id}),
        ))
        .await?;
        Ok(())
    }

    pub async fn unfollow(&self, member_id: i64) -> Result<(), ClientError> {
        let url = format!("{}/api/members/follow", self.services().member);
        self.execute_value(
            RequestSpec::delete(url).json(json!({"memberIdToUnfollow": member_id})),
        )
        .await?;
        Ok(())
    }

    /// Both sides of the follow graph for the signed-in member.
    pub async fn followers_followings(&self) -> Result<FollowersFollowings, ClientError> {
        let url = format!("{}/api/members/followers-followings", self.services().member);
        let envelope: ApiEnvelope<FollowersFollowings> =
            self.execute_json(RequestSpec::get(url)).await?;
        Ok(envelope.data)
    }

    /// The members the signed-in member follows, with the handle fallback
    /// the feed UI expects.
    pub async fn following_members(&self) -> Result<Vec<FollowingMember>, ClientError> {
        let mut members = self.followers_followings().await?.followings.content;
        for member in &mut members {
            if member.handle.is_none() {
                member.handle = Some(member.member_name.clone());
            }
        }
        Ok(members)
    }

    pub async fn my_profile(&self) -> Result<AuthUser, ClientError> {
        let url = format!("{}/api/members/profile", self.services().member);
        let value = self.execute_value(RequestSpec::get(url)).await?;
        let profile = value.get("data").cloned().unwrap_or(value);

        let mut user: AuthUser = serde_json::from_value(profile)?;
        if user.id.is_empty() {
            if let Some(member_id) = user.member_id {
                user.id = member_id.to_string();
            }
        }
        Ok(user)
    }

    pub async fn update_profile(&self, profile: &ProfileData) -> Result<(), ClientError> {
        let url = format!("{}/api/members/profile", self.services().member);
        self.execute_value(RequestSpec::put_json(url, serde_json::to_value(profile)?))
            .await?;
        Ok(())
    }

    pub async fn update_handle(&self, new_handle: &str) -> Result<(), ClientError> {
        let url = format!("{}/api/members/profile/handle", self.services().member);
        self.execute_value(RequestSpec::put_json(url, json!({"newHandle": new_handle})))
            .await?;
        Ok(())
    }
}
